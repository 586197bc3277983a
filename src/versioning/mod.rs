// src/versioning/mod.rs
//! Version-label inference: ordering, timeline reconstruction, backfilling.

pub mod backfill;
pub mod ordering;
pub mod timeline;

pub use backfill::{backfill_versions, VersionRepairReport};
pub use ordering::{is_version_higher, VersionTokens};
pub use timeline::{DatedVersion, VersionTimeline};
