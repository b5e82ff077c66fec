// Public API
pub use aggregator::{StatsAggregator, RECENT_RESULTS_LIMIT};
pub use models::{PlayerStatsResponse, PlayerSummary, RecentResult};

pub mod handlers;

// Internal modules
mod aggregator;
mod models;
