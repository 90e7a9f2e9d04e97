mod google;
pub mod identity;

pub use google::GoogleTrendsClient;
pub use identity::{IDENTITY_POOL, choose_identity};

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use common::Result;

use crate::models::{RelatedQueries, Timeframe};

/// Upstream hard limit on phrases compared in one request.
pub const MAX_PHRASES_PER_REQUEST: usize = 5;

/// The three request kinds the upstream trends source serves.
///
/// Implementations issue exactly one upstream exchange per call and never retry or pace;
/// that belongs to [`crate::fetcher::ResilientFetcher`].
#[async_trait]
pub trait TrendsApi: Send {
    /// Time-indexed interest table for at most five phrases.
    async fn interest_over_time(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
    ) -> Result<RecordBatch>;

    async fn interest_by_region(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
    ) -> Result<RecordBatch>;

    async fn related_queries(
        &mut self,
        phrase: &str,
        timeframe: Timeframe,
    ) -> Result<RelatedQueries>;

    /// Tears down the session and rebuilds it under a new browser identity.
    async fn reinitialize(&mut self, identity: &str) -> Result<()>;
}
