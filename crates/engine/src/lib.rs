//! Leaderboard Engine — ranked score tables with atomic conditional updates
//!
//! Self-contained crate behind the HTTP boundary. Provides:
//! - Per-(service, board) ranked tables with deterministic tie-breaking
//! - Conditional "raise my score" submission under a configurable policy
//! - Rank, neighbor-window, and paginated top-K queries
//! - Opt-in per-member property decoration via the overlay contract

pub mod error;
pub mod overlay;
pub mod policy;
pub mod query;
pub mod registry;
pub mod table;
pub mod types;

// Re-exports for convenience
pub use error::{EngineError, EngineResult};
pub use overlay::{PropertyOverlay, SqliteOverlay};
pub use policy::UpdatePolicy;
pub use query::WindowQuery;
pub use registry::LeaderboardEngine;
pub use table::RankTable;
pub use types::{BoardKey, RankedEntry, ScorePolicy, SubmitOutcome};
