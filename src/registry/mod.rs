//! Routing object registry.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     routing::translator (config → records)
//!     → ObjectStore::insert_all
//!
//! Every probe cycle:
//!     health::monitor → snapshot(group) → probe → update_tags(name, f)
//!
//! Every request:
//!     live routing path → get / snapshot → decode state → route or skip
//! ```
//!
//! # Design Decisions
//! - One `ArcSwap` slot per key: readers never block, writers retry on conflict
//! - No global lock for routine reads and writes; only `snapshot` walks all shards
//! - Records are immutable once published, updates swap in a new version
//! - Missing keys are reported as `None`/`false`, never as errors

pub mod record;
pub mod store;

pub use record::RoutingObjectRecord;
pub use store::{ObjectStore, RegistryError};
