//! budget-client: Client SDK for the budget service.
//!
//! Wraps the REST API with an authenticated HTTP client that performs
//! a single transparent token refresh on authentication failure, a
//! process-wide session store backed by a durable key-value boundary,
//! and a notification feed that reconciles paginated fetches with
//! live push events.
pub mod client;
pub mod config;
pub mod http;
pub mod models;
pub mod push;
pub mod services;
pub mod session;

pub use client::BudgetClient;
pub use client_core::error::ClientError;
pub use client_core::storage::{FileStore, KeyValueStore, MemoryStore};
pub use http::ApiClient;
pub use session::{Session, SessionStore};
