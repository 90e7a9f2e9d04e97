
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use common::config::Settings;
use common::{Error, Result};
use tracing::{debug, info, warn};

use crate::client::{MAX_PHRASES_PER_REQUEST, TrendsApi, choose_identity};
use crate::models::{InterestSeries, RelatedQueries, Timeframe};
use crate::table;
use crate::utils::{RetryOutcome, RetryPolicy, Retryable, Sleeper, uniform_delay};

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    pub retry: RetryPolicy,
}

impl FetchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            delay_min_secs: settings.pacing.delay_min_secs,
            delay_max_secs: settings.pacing.delay_max_secs,
            retry: RetryPolicy::from_config(&settings.retry),
        }
    }
}

/// Owns the client, its current browser identity and the process-wide request counter.
///
/// Calls are strictly sequential; every wait goes through the injected [`Sleeper`].
pub struct ResilientFetcher<C, S> {
    client: C,
    sleeper: S,
    identity: String,
    request_count: u64,
    options: FetchOptions,
}

impl<C: TrendsApi, S: Sleeper> ResilientFetcher<C, S> {
    pub fn new(client: C, identity: String, sleeper: S, options: FetchOptions) -> Self {
        Self {
            client,
            sleeper,
            identity,
            request_count: 0,
            options,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Sleeps for a uniformly drawn pacing delay.
    pub async fn pace(&self) {
        let delay = uniform_delay(self.options.delay_min_secs, self.options.delay_max_secs);
        debug!(delay_secs = delay.as_secs_f64(), "Pacing delay");
        self.sleeper.sleep(delay).await;
    }

    /// Pacing before a new request, skipped for the first request of the process.
    async fn pace_request(&self) {
        if self.request_count > 0 {
            self.pace().await;
        }
    }

    /// Average interest per phrase for the first five phrases, `None` once retries run out.
    ///
    /// Empty tables and all-zero averages count as failures, since a soft block from the
    /// upstream usually looks like well-formed empty data.
    pub async fn average_interest(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
    ) -> Option<InterestSeries> {
        let batch = capped(phrases);
        if batch.is_empty() {
            return None;
        }
        self.pace_request().await;

        let mut operation = AverageInterestAttempt {
            session: Session {
                client: &mut self.client,
                identity: &mut self.identity,
                request_count: &mut self.request_count,
            },
            batch: &batch,
            timeframe,
        };

        match self.options.retry.execute(&self.sleeper, &mut operation).await {
            RetryOutcome::Success(averages) => Some(averages),
            RetryOutcome::Exhausted { attempts } => {
                warn!(?batch, %timeframe, attempts, "Giving up on interest request");
                None
            }
        }
    }

    /// Raw interest-by-region table, retried like [`Self::average_interest`].
    pub async fn regional_interest(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
    ) -> Option<RecordBatch> {
        let batch = capped(phrases);
        if batch.is_empty() {
            return None;
        }
        self.pace_request().await;

        let mut operation = RegionAttempt {
            session: Session {
                client: &mut self.client,
                identity: &mut self.identity,
                request_count: &mut self.request_count,
            },
            batch: &batch,
            timeframe,
        };

        match self.options.retry.execute(&self.sleeper, &mut operation).await {
            RetryOutcome::Success(table) => Some(table),
            RetryOutcome::Exhausted { attempts } => {
                warn!(?batch, %timeframe, attempts, "Giving up on region request");
                None
            }
        }
    }

    /// Best-effort related queries: one paced attempt, failures are logged and dropped.
    pub async fn related_queries(
        &mut self,
        phrase: &str,
        timeframe: Timeframe,
    ) -> Option<RelatedQueries> {
        self.pace_request().await;
        self.request_count += 1;

        match self.client.related_queries(phrase, timeframe).await {
            Ok(related) if !related.is_empty() => Some(related),
            Ok(_) => {
                debug!(phrase, %timeframe, "No related queries");
                None
            }
            Err(e) => {
                warn!(phrase, %timeframe, error = %e, "Related queries request failed");
                None
            }
        }
    }
}

fn capped(phrases: &[String]) -> Vec<String> {
    phrases.iter().take(MAX_PHRASES_PER_REQUEST).cloned().collect()
}

/// Mutable session state borrowed from the fetcher for the length of one retried request.
struct Session<'a, C> {
    client: &'a mut C,
    identity: &'a mut String,
    request_count: &'a mut u64,
}

impl<C: TrendsApi> Session<'_, C> {
    async fn rotate_identity(&mut self) {
        let next = choose_identity(Some(self.identity.as_str()));
        match self.client.reinitialize(&next).await {
            Ok(()) => {
                info!(from = %self.identity, to = %next, "Rotated browser identity");
                *self.identity = next;
            }
            Err(e) => warn!(identity = %next, error = %e, "Failed to rotate browser identity"),
        }
    }
}

struct AverageInterestAttempt<'a, C> {
    session: Session<'a, C>,
    batch: &'a [String],
    timeframe: Timeframe,
}

#[async_trait]
impl<'a, C: TrendsApi> Retryable for AverageInterestAttempt<'a, C> {
    type Output = InterestSeries;

    async fn attempt(&mut self, _attempt: u32) -> Result<InterestSeries> {
        *self.session.request_count += 1;
        let raw = self
            .session
            .client
            .interest_over_time(self.batch, self.timeframe)
            .await?;

        let averages = table::average_interest(Some(&raw), self.batch)?.ok_or(Error::NoSignal)?;
        if !averages.has_signal() {
            return Err(Error::NoSignal);
        }
        Ok(averages)
    }

    async fn before_retry(&mut self, _failed_attempt: u32) {
        self.session.rotate_identity().await;
    }
}

struct RegionAttempt<'a, C> {
    session: Session<'a, C>,
    batch: &'a [String],
    timeframe: Timeframe,
}

#[async_trait]
impl<'a, C: TrendsApi> Retryable for RegionAttempt<'a, C> {
    type Output = RecordBatch;

    async fn attempt(&mut self, _attempt: u32) -> Result<RecordBatch> {
        *self.session.request_count += 1;
        let table = self
            .session
            .client
            .interest_by_region(self.batch, self.timeframe)
            .await?;
        if table.num_rows() == 0 {
            return Err(Error::NoSignal);
        }
        Ok(table)
    }

    async fn before_retry(&mut self, _failed_attempt: u32) {
        self.session.rotate_identity().await;
    }
}
