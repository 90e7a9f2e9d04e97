use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::BTreeMap;

use super::Timeframe;

/// Average interest per requested phrase, in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterestSeries {
    entries: Vec<(String, f64)>,
}

impl InterestSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a phrase's average; NaN is stored as zero.
    pub fn insert(&mut self, phrase: impl Into<String>, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value };
        self.entries.push((phrase.into(), value));
    }

    pub fn get(&self, phrase: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(p, _)| p == phrase)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when at least one phrase scored strictly above zero.
    pub fn has_signal(&self) -> bool {
        self.entries.iter().any(|(_, v)| *v > 0.0)
    }

    /// Phrase with the highest average; the earliest one wins ties.
    pub fn top(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (phrase, value) in self.iter() {
            match best {
                Some((_, current)) if value <= current => {}
                _ => best = Some((phrase, value)),
            }
        }
        best
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for InterestSeries {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut series = InterestSeries::new();
        for (phrase, value) in iter {
            series.insert(phrase, value);
        }
        series
    }
}

impl Serialize for InterestSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (phrase, value) in &self.entries {
            map.serialize_entry(phrase, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedQuery {
    pub query: String,
    pub value: f64,
}

/// Phrases the upstream associates with a query: most common and fastest growing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedQueries {
    pub top: Vec<RelatedQuery>,
    pub rising: Vec<RelatedQuery>,
}

impl RelatedQueries {
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.rising.is_empty()
    }
}

/// Collected data for one country and one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    pub averages: InterestSeries,
    pub top_query: String,
    pub max_interest: f64,
    pub related_queries: Option<RelatedQueries>,
    /// Full catalog phrase list for the country, not only the batch sent upstream.
    pub all_queries: Vec<String>,
}

impl PeriodResult {
    /// Builds a period from a batch average, `None` when nothing scored above zero.
    pub fn from_averages(averages: InterestSeries, all_queries: &[String]) -> Option<Self> {
        if !averages.has_signal() {
            return None;
        }
        let (top_query, max_interest) = averages.top().map(|(p, v)| (p.to_string(), v))?;
        Some(Self {
            averages,
            top_query,
            max_interest,
            related_queries: None,
            all_queries: all_queries.to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryResult {
    pub country: String,
    pub periods: BTreeMap<Timeframe, Option<PeriodResult>>,
}

impl CountryResult {
    pub fn new(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            periods: BTreeMap::new(),
        }
    }

    pub fn period(&self, timeframe: Timeframe) -> Option<&PeriodResult> {
        self.periods.get(&timeframe).and_then(Option::as_ref)
    }

    pub fn has_valid_period(&self) -> bool {
        self.periods.values().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_prefers_first_maximum() {
        let series: InterestSeries = [("a", 40.0), ("b", 55.0), ("c", 55.0)]
            .into_iter()
            .collect();
        assert_eq!(series.top(), Some(("b", 55.0)));
    }

    #[test]
    fn test_all_zero_series_has_no_period() {
        let series: InterestSeries = [("a", 0.0), ("b", 0.0)].into_iter().collect();
        assert!(!series.has_signal());
        assert!(PeriodResult::from_averages(series, &["a".to_string()]).is_none());
    }

    #[test]
    fn test_nan_stored_as_zero() {
        let series: InterestSeries = [("a", f64::NAN)].into_iter().collect();
        assert_eq!(series.get("a"), Some(0.0));
    }

    #[test]
    fn test_series_serializes_in_request_order() {
        let series: InterestSeries = [("zeta", 1.0), ("alpha", 2.0)].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&series).unwrap(),
            r#"{"zeta":1.0,"alpha":2.0}"#
        );
    }
}
