//! opyn-api: HTTP API layer for the Opyn client
//!
//! Exposes the trading board, vault lists, option creation and wallet
//! actions of one [`opyn_session::Session`] to a local frontend.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;

pub use server::*;
pub use state::{AppState, WalletState};
