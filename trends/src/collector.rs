use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::client::TrendsApi;
use crate::fetcher::ResilientFetcher;
use crate::models::{CountryResult, PeriodResult, Timeframe};
use crate::utils::Sleeper;

/// Outcome of one batch pass, in catalog order.
#[derive(Debug, Default)]
pub struct CollectionReport {
    /// `None` marks a country with no valid data in any timeframe.
    pub results: Vec<(String, Option<CountryResult>)>,
    pub request_count: u64,
}

impl CollectionReport {
    /// Countries skipped for lack of signal.
    pub fn unfetchable(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, result)| result.is_none())
            .map(|(country, _)| country.as_str())
            .collect()
    }

    /// Splits into collected results and the names of unfetchable countries.
    pub fn into_partition(self) -> (Vec<CountryResult>, Vec<String>) {
        let mut valid = Vec::new();
        let mut unfetchable = Vec::new();
        for (country, result) in self.results {
            match result {
                Some(result) => valid.push(result),
                None => unfetchable.push(country),
            }
        }
        (valid, unfetchable)
    }
}

pub struct BatchCollector<C, S> {
    fetcher: ResilientFetcher<C, S>,
}

impl<C: TrendsApi, S: Sleeper> BatchCollector<C, S> {
    pub fn new(fetcher: ResilientFetcher<C, S>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &ResilientFetcher<C, S> {
        &self.fetcher
    }

    /// Collects every timeframe for one country; `None` when no timeframe had signal.
    pub async fn collect_country(
        &mut self,
        country: &str,
        phrases: &[String],
    ) -> Option<CountryResult> {
        let mut result = CountryResult::new(country);

        for timeframe in Timeframe::ALL {
            let period = match self.fetcher.average_interest(phrases, timeframe).await {
                Some(averages) => PeriodResult::from_averages(averages, phrases),
                None => None,
            };

            let period = match period {
                Some(mut period) => {
                    period.related_queries = self
                        .fetcher
                        .related_queries(&period.top_query, timeframe)
                        .await;
                    info!(
                        country,
                        %timeframe,
                        top_query = %period.top_query,
                        max_interest = period.max_interest,
                        "Collected period"
                    );
                    Some(period)
                }
                None => {
                    warn!(country, %timeframe, "No data for period");
                    None
                }
            };

            result.periods.insert(timeframe, period);
        }

        if result.has_valid_period() {
            Some(result)
        } else {
            warn!(country, "No valid data in any period, skipping country");
            None
        }
    }

    /// One pass over the catalog with a pacing delay between countries.
    pub async fn collect_all(&mut self, catalog: &Catalog) -> CollectionReport {
        let total = catalog.len();
        let mut report = CollectionReport::default();
        info!(countries = total, phrases = catalog.total_phrases(), "Starting collection");

        for (idx, entry) in catalog.iter().enumerate() {
            info!("[{}/{}] Collecting {}", idx + 1, total, entry.country);

            let result = self.collect_country(&entry.country, &entry.phrases).await;
            report.results.push((entry.country.clone(), result));

            if idx + 1 < total {
                self.fetcher.pace().await;
            }
        }

        report.request_count = self.fetcher.request_count();
        info!(
            requests = report.request_count,
            unfetchable = report.unfetchable().len(),
            "Collection finished"
        );
        report
    }
}
