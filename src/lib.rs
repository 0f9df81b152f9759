//! devimpact - Developer impact profiles from aggregated GitHub activity
//!
//! devimpact turns twelve months of pre-aggregated activity into an impact
//! profile through a deterministic pipeline: normalization → dimension
//! scoring → confidence → composite → archetype → tier → temporal smoothing.
//!
//! ## Modules
//!
//! - **Scoring**: four independent 0-100 dimension scores (Building, Guarding,
//!   Consistency, Breadth) built from saturating curves
//! - **Classification**: an ordered decision tree assigning one of six archetypes
//! - **Smoothing**: a one-step EMA against the previous day's snapshot
//! - **Verification**: short HMAC codes binding a profile to a day

pub mod classifier;
pub mod composite;
pub mod confidence;
pub mod config;
pub mod curves;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod scorers;
pub mod smoothing;
pub mod snapshot;
pub mod tier;
pub mod types;
pub mod verification;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ScoringConfig;
pub use error::ComputeError;
pub use pipeline::{compute_impact, compute_impact_at, impact_to_json, ImpactProcessor};
pub use smoothing::apply_ema;
pub use snapshot::{InMemorySnapshotStore, SnapshotStore};
pub use types::{Archetype, DimensionScores, ImpactResult, ProfileType, RawActivityStats, Tier};
pub use verification::verification_hash;

/// Engine version embedded in CLI and FFI reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "devimpact";
