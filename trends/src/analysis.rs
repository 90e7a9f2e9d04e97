
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{CountryResult, InterestSeries, RelatedQueries, RelatedQuery, Timeframe};

#[derive(Debug, Clone, Serialize)]
pub struct PeriodAnalysis {
    pub max_interest: f64,
    pub top_query: String,
    pub all_interests: InterestSeries,
    pub related_queries: RelatedQueries,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedCountry {
    pub country: String,
    pub query_count: usize,
    pub periods: BTreeMap<Timeframe, PeriodAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub country: String,
    pub interest: f64,
    pub top_query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub country: String,
    pub interest_1m: f64,
    pub interest_3m: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryInterest {
    pub query: String,
    pub interest: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedQueriesView {
    pub top: Vec<QueryInterest>,
    pub rising: Vec<QueryInterest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedBundle {
    /// Countries in collection order.
    pub countries: Vec<AnalyzedCountry>,
    pub ranking: BTreeMap<Timeframe, Vec<RankingEntry>>,
    pub trends: Vec<Trend>,
    pub generated_at: DateTime<Utc>,
}

/// Builds the analysis over countries that produced at least one valid period.
pub fn analyze_all_countries(valid_results: &[CountryResult]) -> AnalyzedBundle {
    let countries: Vec<AnalyzedCountry> = valid_results.iter().map(analyze_country).collect();

    let ranking = Timeframe::ALL
        .into_iter()
        .map(|timeframe| (timeframe, build_ranking(&countries, timeframe)))
        .collect();
    let trends = build_trends(&countries);

    AnalyzedBundle {
        countries,
        ranking,
        trends,
        generated_at: Utc::now(),
    }
}

fn analyze_country(result: &CountryResult) -> AnalyzedCountry {
    let mut query_count = 0;
    let mut periods = BTreeMap::new();

    for (timeframe, period) in &result.periods {
        let Some(period) = period else { continue };
        query_count = query_count.max(period.all_queries.len());
        if period.max_interest <= 0.0 {
            continue;
        }
        periods.insert(
            *timeframe,
            PeriodAnalysis {
                max_interest: period.max_interest,
                top_query: period.top_query.clone(),
                all_interests: period.averages.clone(),
                related_queries: period.related_queries.clone().unwrap_or_default(),
            },
        );
    }

    AnalyzedCountry {
        country: result.country.clone(),
        query_count,
        periods,
    }
}

fn build_ranking(countries: &[AnalyzedCountry], timeframe: Timeframe) -> Vec<RankingEntry> {
    let mut ranking: Vec<RankingEntry> = countries
        .iter()
        .filter_map(|country| {
            country.periods.get(&timeframe).map(|period| RankingEntry {
                country: country.country.clone(),
                interest: period.max_interest,
                top_query: period.top_query.clone(),
            })
        })
        .collect();
    // Stable: equal interest keeps collection order.
    ranking.sort_by(|a, b| b.interest.total_cmp(&a.interest));
    ranking
}

fn build_trends(countries: &[AnalyzedCountry]) -> Vec<Trend> {
    countries
        .iter()
        .filter_map(|country| {
            let one_month = country.periods.get(&Timeframe::OneMonth)?;
            let three_months = country.periods.get(&Timeframe::ThreeMonths)?;
            Some(Trend {
                country: country.country.clone(),
                interest_1m: one_month.max_interest,
                interest_3m: three_months.max_interest,
                change_percent: change_percent(one_month.max_interest, three_months.max_interest),
            })
        })
        .collect()
}

/// Relative change from the 3-month to the 1-month interest, zero without a baseline.
pub fn change_percent(interest_1m: f64, interest_3m: f64) -> f64 {
    if interest_3m > 0.0 {
        (interest_1m - interest_3m) / interest_3m * 100.0
    } else {
        0.0
    }
}

fn project(queries: &[RelatedQuery], limit: usize) -> Vec<QueryInterest> {
    queries
        .iter()
        .take(limit)
        .map(|q| QueryInterest {
            query: q.query.clone(),
            interest: q.value,
        })
        .collect()
}

impl AnalyzedBundle {
    pub fn country(&self, name: &str) -> Option<&AnalyzedCountry> {
        self.countries.iter().find(|c| c.country == name)
    }

    fn period(&self, country: &str, timeframe: Timeframe) -> Option<&PeriodAnalysis> {
        self.country(country)?.periods.get(&timeframe)
    }

    pub fn ranking(&self, timeframe: Timeframe) -> &[RankingEntry] {
        self.ranking
            .get(&timeframe)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn top_countries(&self, timeframe: Timeframe, limit: usize) -> &[RankingEntry] {
        let ranking = self.ranking(timeframe);
        &ranking[..ranking.len().min(limit)]
    }

    /// Countries whose 1-month interest beat the 3-month one, largest gain first.
    pub fn rising_countries(&self, limit: usize) -> Vec<&Trend> {
        let mut rising: Vec<&Trend> = self
            .trends
            .iter()
            .filter(|t| t.change_percent > 0.0)
            .collect();
        rising.sort_by(|a, b| b.change_percent.total_cmp(&a.change_percent));
        rising.truncate(limit);
        rising
    }

    /// Countries whose interest fell, largest drop first.
    pub fn falling_countries(&self, limit: usize) -> Vec<&Trend> {
        let mut falling: Vec<&Trend> = self
            .trends
            .iter()
            .filter(|t| t.change_percent < 0.0)
            .collect();
        falling.sort_by(|a, b| a.change_percent.total_cmp(&b.change_percent));
        falling.truncate(limit);
        falling
    }

    pub fn related_queries_for(
        &self,
        country: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Option<RelatedQueriesView> {
        let related = &self.period(country, timeframe)?.related_queries;
        Some(RelatedQueriesView {
            top: project(&related.top, limit),
            rising: project(&related.rising, limit),
        })
    }

    /// Every phrase's interest for the period, highest first.
    pub fn all_queries_interest_for(
        &self,
        country: &str,
        timeframe: Timeframe,
    ) -> Option<Vec<QueryInterest>> {
        let period = self.period(country, timeframe)?;
        let mut interests: Vec<QueryInterest> = period
            .all_interests
            .iter()
            .map(|(query, value)| QueryInterest {
                query: query.to_string(),
                interest: if value.is_nan() { 0.0 } else { value },
            })
            .collect();
        interests.sort_by(|a, b| b.interest.total_cmp(&a.interest));
        Some(interests)
    }

    pub fn query_count(&self, country: &str) -> usize {
        self.country(country).map(|c| c.query_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PeriodResult;

    fn period(averages: &[(&str, f64)]) -> Option<PeriodResult> {
        let series: InterestSeries = averages.iter().map(|(p, v)| (*p, *v)).collect();
        let phrases: Vec<String> = averages.iter().map(|(p, _)| p.to_string()).collect();
        PeriodResult::from_averages(series, &phrases)
    }

    fn country(
        name: &str,
        one_month: Option<PeriodResult>,
        three_months: Option<PeriodResult>,
    ) -> CountryResult {
        let mut result = CountryResult::new(name);
        result.periods.insert(Timeframe::OneMonth, one_month);
        result.periods.insert(Timeframe::ThreeMonths, three_months);
        result
    }

    fn names(entries: &[RankingEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.country.as_str()).collect()
    }

    #[test]
    fn test_ranking_is_stable_for_ties() {
        let bundle = analyze_all_countries(&[
            country("A", None, period(&[("a", 50.0)])),
            country("B", None, period(&[("b", 80.0)])),
            country("C", None, period(&[("c", 50.0)])),
        ]);

        assert_eq!(names(bundle.top_countries(Timeframe::ThreeMonths, 10)), vec!["B", "A", "C"]);
        assert_eq!(names(bundle.top_countries(Timeframe::ThreeMonths, 2)), vec!["B", "A"]);
        assert!(bundle.top_countries(Timeframe::OneMonth, 10).is_empty());
    }

    #[test]
    fn test_trend_change_percent() {
        let bundle = analyze_all_countries(&[
            country("X", period(&[("x", 70.0)]), period(&[("x", 50.0)])),
            country("Z", period(&[("z", 30.0)]), period(&[("z", 60.0)])),
            country("W", None, period(&[("w", 60.0)])),
        ]);

        assert_eq!(bundle.trends.len(), 2);
        assert!((bundle.trends[0].change_percent - 40.0).abs() < 1e-9);
        assert_eq!(change_percent(35.0, 0.0), 0.0);

        let rising = bundle.rising_countries(10);
        assert_eq!(rising.len(), 1);
        assert_eq!(rising[0].country, "X");

        let falling = bundle.falling_countries(10);
        assert_eq!(falling.len(), 1);
        assert_eq!(falling[0].country, "Z");
        assert!((falling[0].change_percent + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rising_sorted_and_truncated() {
        let bundle = analyze_all_countries(&[
            country("P", period(&[("p", 55.0)]), period(&[("p", 50.0)])),
            country("Q", period(&[("q", 90.0)]), period(&[("q", 45.0)])),
            country("R", period(&[("r", 60.0)]), period(&[("r", 40.0)])),
        ]);

        let rising: Vec<&str> = bundle
            .rising_countries(2)
            .into_iter()
            .map(|t| t.country.as_str())
            .collect();
        assert_eq!(rising, vec!["Q", "R"]);
    }

    #[test]
    fn test_related_queries_for_absent_is_none() {
        let mut with_related = period(&[("t", 90.0)]).unwrap();
        with_related.related_queries = Some(RelatedQueries {
            top: (1..=8)
                .map(|i| RelatedQuery { query: format!("top {i}"), value: 100.0 - i as f64 })
                .collect(),
            rising: vec![RelatedQuery { query: "new vpn".to_string(), value: 4500.0 }],
        });
        let bundle = analyze_all_countries(&[country("T", None, Some(with_related))]);

        assert!(bundle.related_queries_for("Nowhere", Timeframe::ThreeMonths, 5).is_none());
        assert!(bundle.related_queries_for("T", Timeframe::OneMonth, 5).is_none());

        let view = bundle.related_queries_for("T", Timeframe::ThreeMonths, 5).unwrap();
        assert_eq!(view.top.len(), 5);
        assert_eq!(view.top[0], QueryInterest { query: "top 1".to_string(), interest: 99.0 });
        assert_eq!(view.rising[0].interest, 4500.0);
    }

    #[test]
    fn test_all_queries_interest_sorted_desc() {
        let bundle = analyze_all_countries(&[country(
            "K",
            None,
            period(&[("k1", 10.0), ("k2", 0.0), ("k3", 75.0)]),
        )]);

        let interests = bundle.all_queries_interest_for("K", Timeframe::ThreeMonths).unwrap();
        let order: Vec<&str> = interests.iter().map(|q| q.query.as_str()).collect();
        assert_eq!(order, vec!["k3", "k1", "k2"]);
        assert!(bundle.all_queries_interest_for("K", Timeframe::OneMonth).is_none());
        assert_eq!(bundle.query_count("K"), 3);
        assert_eq!(bundle.query_count("missing"), 0);
    }
}
