//! OKR Dashboard — progress, history, rankings and objective rollups
//! for one company quarter.
//!
//! [`DashboardEngine`] pulls records through the
//! [`OkrRepositories`](okr_core::repository::OkrRepositories) bundle and
//! computes five independent sections. The pure calculations live in
//! [`progress`], [`quarter`], [`ranking`] and [`rollup`] so they can be
//! tested without a database.

pub mod cache;
pub mod engine;
pub mod progress;
pub mod quarter;
pub mod ranking;
pub mod rollup;

pub use cache::{CacheRetryPolicy, CacheWriteReport, ObjectiveGroupCache};
pub use engine::{Dashboard, DashboardEngine, DashboardScope};
pub use quarter::QuarterPerformance;
pub use ranking::{KrRanking, UserRanking};
pub use rollup::ObjectiveRollup;
