pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod storage;

pub use application::{LedgerError, LedgerService, LockRegistry};
pub use domain::*;
pub use storage::{MemoryStore, PointStore, SqliteStore};
