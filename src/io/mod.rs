pub mod export;
pub mod replay;

pub use export::Exporter;
pub use replay::{read_operations, replay, Operation, RejectedOperation, ReplaySummary};
