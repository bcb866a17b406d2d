//! client-core: Shared infrastructure for the budget client SDK.
pub mod error;
pub mod observability;
pub mod storage;

pub use serde;
pub use serde_json;
pub use tracing;
