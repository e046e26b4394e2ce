//! 0x Standard Relayer API (v3) order-book reader
//!
//! Records are decoded one by one; a record with a missing, mistyped or
//! unparseable field is skipped instead of failing the whole book.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use opyn_core::{Order, OrderBook, RelayConfig, RelayReader, SourceError};
use serde::Deserialize;

use crate::{http_client, request_error, Result};

const SOURCE_NAME: &str = "0x relay";

/// ERC-20 asset proxy id (`bytes4(keccak256("ERC20Token(address)"))`)
const ERC20_PROXY_ID: &str = "f47261b0";

/// Orders requested per side
const PER_PAGE: u32 = 100;

/// Encode an ERC-20 token address as 0x asset data
pub fn erc20_asset_data(token: Address) -> String {
    format!("0x{}{:0>64}", ERC20_PROXY_ID, hex::encode(token))
}

/// Order-book reader for a 0x standard relayer
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(SOURCE_NAME)?,
            config,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    fn orderbook_url(&self) -> String {
        format!("{}/orderbook", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RelayReader for RelayClient {
    async fn order_book(&self, base: Address, quote: Address) -> Result<OrderBook> {
        let url = self.orderbook_url();
        let per_page = PER_PAGE.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("baseAssetData", erc20_asset_data(base)),
                ("quoteAssetData", erc20_asset_data(quote)),
                ("perPage", per_page),
            ])
            .send()
            .await
            .map_err(|e| request_error(SOURCE_NAME, &url, e))?;

        if !response.status().is_success() {
            return Err(SourceError::api(
                SOURCE_NAME,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: OrderbookResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(format!("orderbook: {}", e)))?;

        Ok(body.into_order_book())
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OrderbookResponse {
    bids: PagedRecords,
    asks: PagedRecords,
}

#[derive(Debug, Deserialize)]
struct PagedRecords {
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderRecord {
    order: WireOrder,
    meta_data: WireMetaData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireOrder {
    maker_address: Address,
    taker_address: Address,
    fee_recipient_address: Address,
    sender_address: Address,
    maker_asset_amount: String,
    taker_asset_amount: String,
    maker_fee: String,
    taker_fee: String,
    expiration_time_seconds: String,
    salt: String,
    maker_asset_data: String,
    taker_asset_data: String,
    exchange_address: Address,
    chain_id: u64,
    signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetaData {
    order_hash: String,
    remaining_fillable_taker_asset_amount: String,
}

impl OrderbookResponse {
    /// Convert both sides, dropping records that do not parse
    fn into_order_book(self) -> OrderBook {
        OrderBook {
            asks: convert_records(self.asks.records),
            bids: convert_records(self.bids.records),
        }
    }
}

fn convert_records(records: Vec<serde_json::Value>) -> Vec<Order> {
    records
        .into_iter()
        .filter_map(|value| {
            let order_hash = value["metaData"]["orderHash"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let order = serde_json::from_value::<OrderRecord>(value)
                .map_err(|e| SourceError::ParseError(format!("order record: {}", e)))
                .and_then(OrderRecord::into_order);
            match order {
                Ok(order) => Some(order),
                Err(e) => {
                    tracing::debug!(order_hash, error = %e, "Skipping unparseable relay order");
                    None
                }
            }
        })
        .collect()
}

impl OrderRecord {
    fn into_order(self) -> Result<Order> {
        let o = self.order;
        Ok(Order {
            order_hash: self.meta_data.order_hash,
            maker_address: o.maker_address,
            taker_address: o.taker_address,
            fee_recipient_address: o.fee_recipient_address,
            sender_address: o.sender_address,
            maker_asset_amount: parse_amount("makerAssetAmount", &o.maker_asset_amount)?,
            taker_asset_amount: parse_amount("takerAssetAmount", &o.taker_asset_amount)?,
            maker_fee: parse_amount("makerFee", &o.maker_fee)?,
            taker_fee: parse_amount("takerFee", &o.taker_fee)?,
            maker_asset_data: o.maker_asset_data,
            taker_asset_data: o.taker_asset_data,
            expiration_time_seconds: o.expiration_time_seconds.parse().map_err(|_| {
                SourceError::ParseError(format!(
                    "expirationTimeSeconds: {}",
                    o.expiration_time_seconds
                ))
            })?,
            salt: o.salt,
            exchange_address: o.exchange_address,
            chain_id: o.chain_id,
            signature: o.signature,
            remaining_fillable_taker_amount: parse_amount(
                "remainingFillableTakerAssetAmount",
                &self.meta_data.remaining_fillable_taker_asset_amount,
            )?,
        })
    }
}

fn parse_amount(field: &str, raw: &str) -> Result<U256> {
    U256::from_str(raw).map_err(|_| SourceError::ParseError(format!("{}: {}", field, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json(hash: &str, remaining: &str) -> serde_json::Value {
        serde_json::json!({
            "order": {
                "makerAddress": "0x0000000000000000000000000000000000000001",
                "takerAddress": "0x0000000000000000000000000000000000000000",
                "feeRecipientAddress": "0x0000000000000000000000000000000000000000",
                "senderAddress": "0x0000000000000000000000000000000000000000",
                "makerAssetAmount": "1000000000",
                "takerAssetAmount": "25000000000000000",
                "makerFee": "0",
                "takerFee": "0",
                "expirationTimeSeconds": "1700000000",
                "salt": "12345",
                "makerAssetData": "0xf47261b0",
                "takerAssetData": "0xf47261b0",
                "makerFeeAssetData": "0x",
                "takerFeeAssetData": "0x",
                "exchangeAddress": "0x61935cbdd02287b511119ddb11aeb42f1593b7ef",
                "chainId": 1,
                "signature": "0x1b"
            },
            "metaData": {
                "orderHash": hash,
                "remainingFillableTakerAssetAmount": remaining
            }
        })
    }

    #[test]
    fn test_erc20_asset_data() {
        let weth = opyn_core::constants::WETH_ADDRESS;
        assert_eq!(
            erc20_asset_data(weth),
            "0xf47261b0000000000000000000000000c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
        );
    }

    #[test]
    fn test_parse_orderbook_response() {
        let body = serde_json::json!({
            "bids": { "total": 1, "page": 1, "perPage": 100, "records": [record_json("0xb1", "7")] },
            "asks": { "total": 2, "page": 1, "perPage": 100, "records": [
                record_json("0xa1", "25000000000000000"),
                record_json("0xa2", "0"),
            ] }
        });

        let parsed: OrderbookResponse = serde_json::from_value(body).unwrap();
        let book = parsed.into_order_book();

        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.asks[0].order_hash, "0xa1");
        assert_eq!(book.asks[1].remaining_fillable_taker_amount, U256::ZERO);
        assert_eq!(book.bids[0].expiration_time_seconds, 1_700_000_000);
        assert_eq!(book.bids[0].maker_asset_amount, U256::from(1_000_000_000u64));
    }

    #[test]
    fn test_unparseable_record_is_skipped() {
        let mut bad = record_json("0xbad", "1");
        bad["order"]["makerAssetAmount"] = serde_json::json!("not-a-number");

        let body = serde_json::json!({
            "bids": { "records": [bad, record_json("0xgood", "1")] },
            "asks": { "records": [] }
        });

        let parsed: OrderbookResponse = serde_json::from_value(body).unwrap();
        let book = parsed.into_order_book();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].order_hash, "0xgood");
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let mut missing = record_json("0xmissing", "1");
        missing["order"]
            .as_object_mut()
            .unwrap()
            .remove("makerAddress");
        let mut mistyped = record_json("0xmistyped", "1");
        mistyped["order"]["chainId"] = serde_json::json!("mainnet");

        let body = serde_json::json!({
            "bids": { "records": [missing, record_json("0xgood", "1")] },
            "asks": { "records": [mistyped, 42] }
        });

        let parsed: OrderbookResponse = serde_json::from_value(body).unwrap();
        let book = parsed.into_order_book();
        assert_eq!(book.bids.len(), 1);
        assert_eq!(book.bids[0].order_hash, "0xgood");
        assert!(book.asks.is_empty());
    }

    #[test]
    fn test_orderbook_url_trims_slash() {
        let client = RelayClient::new(RelayConfig {
            url: "https://relay.example/sra/v3/".into(),
            expiry_buffer_secs: 60,
        })
        .unwrap();
        assert_eq!(client.orderbook_url(), "https://relay.example/sra/v3/orderbook");
    }
}
