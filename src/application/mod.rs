// Application layer - use cases and orchestration.
// LedgerService is the only entry point to the ledger for the CLI, the HTTP
// server and the exporters.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
