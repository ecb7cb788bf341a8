pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod server;
pub mod storage;

pub use application::LedgerService;
pub use domain::*;
pub use storage::{SnapshotStore, Storage};
