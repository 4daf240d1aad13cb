// Application layer: the ledger service, its error taxonomy and the
// per-account lock registry that serializes mutations.

pub mod error;
pub mod lock;
mod service;

pub use error::*;
pub use lock::LockRegistry;
pub use service::*;
