//! Caching subsystem.
//!
//! [`MetadataCache`] holds successful live responses keyed on the canonical
//! ID set, so repeated requests for the same videos (in any order, with any
//! duplicates) are served without touching the upstream quota. See the
//! [`metadata`] module docs for expiry and eviction details.

pub mod metadata;

pub use metadata::{CacheConfig, MetadataCache};
