//! Soup Cache - per-identity, policy-driven cache manager
//!
//! Serves cached datasets from an in-process memory overlay backed by a
//! persistent indexed store, decides when cached data needs reloading, and
//! tracks every collection it creates so they can be purged together.

pub mod cache;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod policy;
pub mod registry;
pub mod store;

pub use cache::{CacheManager, CacheStats, WriteOutcome};
pub use config::CacheConfig;
pub use error::{CacheError, Result, StoreError};
pub use identity::{Identity, IdentityKey, IdentityProvider, StaticIdentityProvider};
pub use models::{CachePayload, CachedObject, ObjectLayout, ObjectType};
pub use policy::{needs_reload, needs_reload_at, CachePolicy};
pub use registry::InstanceRegistry;
