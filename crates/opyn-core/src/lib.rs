//! opyn-core: Shared types, errors, configuration and data-source traits
//!
//! This crate provides the foundational types used across the workspace,
//! together with the narrow read/write interfaces through which the session
//! layer talks to the chain, the order-book relay and the subgraph.

pub mod config;
pub mod errors;
pub mod sources;
pub mod types;

pub use config::*;
pub use errors::*;
pub use sources::*;
pub use types::*;
