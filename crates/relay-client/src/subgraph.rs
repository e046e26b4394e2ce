//! Options subgraph reader (GraphQL over HTTP)

use std::collections::HashSet;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use opyn_core::{GraphConfig, GraphReader, SourceError, VaultRaw};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{http_client, request_error, Result};

const SOURCE_NAME: &str = "subgraph";

/// Page size of the vault owner query (subgraph maximum)
const OWNERS_PAGE_SIZE: usize = 1000;

const ALL_VAULT_OWNERS_QUERY: &str = r#"
query vaultOwners($first: Int!, $skip: Int!) {
  vaults(first: $first, skip: $skip) {
    owner
  }
}"#;

const VAULT_QUERY: &str = r#"
query vault($id: ID!) {
  vault(id: $id) {
    owner
    collateral
    oTokensIssued
    underlying
  }
}"#;

/// Subgraph reader for vault ownership
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Result<Self> {
        Ok(Self {
            http: http_client(SOURCE_NAME)?,
            config,
        })
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let response = self
            .http
            .post(&self.config.url)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| request_error(SOURCE_NAME, &self.config.url, e))?;

        if !response.status().is_success() {
            return Err(SourceError::api(
                SOURCE_NAME,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: GraphResponse<T> = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(format!("subgraph: {}", e)))?;

        body.into_data()
    }
}

#[async_trait]
impl GraphReader for GraphClient {
    async fn all_vault_owners(&self) -> Result<Vec<Address>> {
        let mut owners = OwnerSet::default();
        let mut skip = 0usize;

        loop {
            let page: VaultsData = self
                .query(
                    ALL_VAULT_OWNERS_QUERY,
                    serde_json::json!({ "first": OWNERS_PAGE_SIZE, "skip": skip }),
                )
                .await?;

            let fetched = page.vaults.len();
            owners.extend(page.vaults.into_iter().map(|vault| vault.owner));

            if fetched < OWNERS_PAGE_SIZE {
                break;
            }
            skip += fetched;
        }

        let owners = owners.into_vec();
        tracing::debug!(count = owners.len(), "Fetched vault owners");
        Ok(owners)
    }

    async fn vault(&self, user: Address, option: Address) -> Result<Option<VaultRaw>> {
        let data: VaultData = self
            .query(
                VAULT_QUERY,
                serde_json::json!({ "id": vault_id(option, user) }),
            )
            .await?;

        data.vault.map(WireVault::into_raw).transpose()
    }
}

/// Distinct owners in first-seen order
#[derive(Default)]
struct OwnerSet {
    seen: HashSet<Address>,
    ordered: Vec<Address>,
}

impl OwnerSet {
    fn extend(&mut self, owners: impl IntoIterator<Item = Address>) {
        for owner in owners {
            if self.seen.insert(owner) {
                self.ordered.push(owner);
            }
        }
    }

    fn into_vec(self) -> Vec<Address> {
        self.ordered
    }
}

/// Subgraph entity id of a vault: `<option>-<owner>`, lowercase hex
pub fn vault_id(option: Address, owner: Address) -> String {
    format!("0x{}-0x{}", hex::encode(option), hex::encode(owner))
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorMessage {
    message: String,
}

impl<T> GraphResponse<T> {
    fn into_data(self) -> Result<T> {
        if let Some(first) = self.errors.first() {
            return Err(SourceError::api(SOURCE_NAME, &first.message));
        }
        self.data
            .ok_or_else(|| SourceError::ParseError("subgraph response without data".into()))
    }
}

#[derive(Debug, Deserialize)]
struct VaultsData {
    vaults: Vec<OwnerOnly>,
}

#[derive(Debug, Deserialize)]
struct OwnerOnly {
    owner: Address,
}

#[derive(Debug, Deserialize)]
struct VaultData {
    vault: Option<WireVault>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireVault {
    owner: Address,
    collateral: String,
    o_tokens_issued: String,
    #[serde(default)]
    underlying: Option<String>,
}

impl WireVault {
    fn into_raw(self) -> Result<VaultRaw> {
        Ok(VaultRaw {
            owner: self.owner,
            collateral: parse_amount("collateral", &self.collateral)?,
            options_issued: parse_amount("oTokensIssued", &self.o_tokens_issued)?,
            underlying: match self.underlying {
                Some(raw) => parse_amount("underlying", &raw)?,
                None => U256::ZERO,
            },
        })
    }
}

fn parse_amount(field: &str, raw: &str) -> Result<U256> {
    U256::from_str(raw).map_err(|_| SourceError::ParseError(format!("{}: {}", field, raw)))
}
