//! Error types for the Opyn client

use thiserror::Error;

/// Core errors that can occur in the client
#[derive(Debug, Error)]
pub enum Error {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Read failures against the chain node, the relay or the subgraph
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} unreachable at {url}")]
    Unreachable {
        source_name: &'static str,
        url: String,
    },

    #[error("{source_name} returned error: {message}")]
    ApiError {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} request timed out after {secs}s")]
    Timeout {
        source_name: &'static str,
        secs: u64,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Not found: {what}")]
    NotFound { what: String },
}

/// Protocol-level input errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid strike price: {message}")]
    InvalidStrike { message: String },

    #[error("Unknown option: {address}")]
    UnknownOption { address: String },

    #[error("Wallet not connected")]
    WalletNotConnected,
}

/// Transaction submission and confirmation errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("No signing wallet configured")]
    NoSigner,

    #[error("Transaction submission failed: {message}")]
    SubmissionFailed { message: String },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("Failed to get receipt: {message}")]
    ReceiptFailed { message: String },

    #[error("Deployed contract address missing from receipt of {tx_hash}")]
    MissingDeployment { tx_hash: String },

    #[error("Read after submission failed: {0}")]
    Read(#[from] SourceError),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

impl SourceError {
    pub fn api(source_name: &'static str, message: impl ToString) -> Self {
        Self::ApiError {
            source_name,
            message: message.to_string(),
        }
    }
}

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::InvalidStrike { .. } => "invalid_strike",
            Self::UnknownOption { .. } => "unknown_option",
            Self::WalletNotConnected => "wallet_not_connected",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } | Self::InvalidStrike { .. } => 400,
            Self::UnknownOption { .. } => 404,
            Self::WalletNotConnected => 401,
        }
    }
}

impl TxError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSigner => "no_signer",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::Reverted { .. } => "reverted",
            Self::ReceiptFailed { .. } => "receipt_failed",
            Self::MissingDeployment { .. } => "missing_deployment",
            Self::Read(_) => "read_failed",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoSigner => 503,
            Self::Reverted { .. } => 422,
            Self::SubmissionFailed { .. }
            | Self::ReceiptFailed { .. }
            | Self::MissingDeployment { .. }
            | Self::Read(_) => 502,
        }
    }
}
