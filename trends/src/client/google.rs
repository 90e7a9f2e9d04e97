use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use common::config::TrendsConfig;
use common::{Error, Result};
use rquest::header::{COOKIE, SET_COOKIE};
use rquest_util::Emulation;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use super::{MAX_PHRASES_PER_REQUEST, TrendsApi};
use crate::models::{
    ExploreResponse, GeoMapResponse, RankedKeyword, RelatedQueries, RelatedQuery,
    RelatedSearchesResponse, Timeframe, TimelineResponse, Widget,
};
use crate::table;

const HOME_URL: &str = "https://trends.google.com/";
const EXPLORE_URL: &str = "https://trends.google.com/trends/api/explore";
const MULTILINE_URL: &str = "https://trends.google.com/trends/api/widgetdata/multiline";
const COMPARED_GEO_URL: &str = "https://trends.google.com/trends/api/widgetdata/comparedgeo";
const RELATED_SEARCHES_URL: &str =
    "https://trends.google.com/trends/api/widgetdata/relatedsearches";

const TIMESERIES_WIDGET: &str = "TIMESERIES";
const GEO_MAP_WIDGET: &str = "GEO_MAP";
const RELATED_QUERIES_WIDGET: &str = "RELATED_QUERIES";

/// Google Trends web API client presenting one emulated browser at a time.
pub struct GoogleTrendsClient {
    http: rquest::Client,
    geo: String,
    category: u32,
    language: String,
    tz_offset: i32,
    cookie: Option<String>,
}

impl GoogleTrendsClient {
    pub fn new(config: &TrendsConfig, identity: &str) -> Result<Self> {
        Ok(Self {
            http: build_http(identity)?,
            geo: config.geo.clone(),
            category: config.category,
            language: config.language.clone(),
            tz_offset: config.tz_offset,
            cookie: None,
        })
    }

    /// Fetches the session cookie Google requires before API calls.
    async fn ensure_session(&mut self) -> Result<()> {
        if self.cookie.is_some() {
            return Ok(());
        }

        let url = Url::parse_with_params(HOME_URL, &[("geo", self.geo.as_str())])?;
        let response = self.http.get(url.as_str()).send().await?;
        if let Some(err) = Error::from_status(response.status().as_u16()) {
            return Err(err);
        }

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .map(|pair| pair.trim().to_string())
            .filter(|pair| !pair.is_empty())
            .collect::<Vec<_>>()
            .join("; ");

        debug!(cookies = cookie.split("; ").count(), "Established trends session");
        self.cookie = Some(cookie);
        Ok(())
    }

    fn explore_url(&self, phrases: &[String], timeframe: Timeframe) -> Result<Url> {
        let items: Vec<Value> = phrases
            .iter()
            .take(MAX_PHRASES_PER_REQUEST)
            .map(|phrase| json!({"keyword": phrase, "time": timeframe.token(), "geo": self.geo}))
            .collect();
        let req = json!({
            "comparisonItem": items,
            "category": self.category,
            "property": "",
        });

        let tz = self.tz_offset.to_string();
        let req = req.to_string();
        Ok(Url::parse_with_params(
            EXPLORE_URL,
            &[
                ("hl", self.language.as_str()),
                ("tz", tz.as_str()),
                ("req", req.as_str()),
            ],
        )?)
    }

    fn widget_url(&self, endpoint: &str, request: &Value, token: &str) -> Result<Url> {
        let tz = self.tz_offset.to_string();
        let req = request.to_string();
        Ok(Url::parse_with_params(
            endpoint,
            &[("req", req.as_str()), ("token", token), ("tz", tz.as_str())],
        )?)
    }

    async fn explore(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
        widget_id: &str,
    ) -> Result<Widget> {
        self.ensure_session().await?;
        let url = self.explore_url(phrases, timeframe)?;
        let body = self.send(self.http.post(url.as_str())).await?;
        let explore: ExploreResponse = serde_json::from_str(strip_guard(&body))?;

        explore
            .widget(widget_id)
            .cloned()
            .ok_or_else(|| Error::MalformedResponse(format!("explore response lacks {} widget", widget_id)))
    }

    async fn widget_data<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &Value,
        token: &str,
    ) -> Result<T> {
        let url = self.widget_url(endpoint, request, token)?;
        let body = self.send(self.http.get(url.as_str())).await?;
        Ok(serde_json::from_str(strip_guard(&body))?)
    }

    async fn send(&self, mut request: rquest::RequestBuilder) -> Result<String> {
        if let Some(cookie) = self.cookie.as_deref().filter(|c| !c.is_empty()) {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        if let Some(err) = Error::from_status(status) {
            debug!(status, "Upstream rejected request");
            return Err(err);
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl TrendsApi for GoogleTrendsClient {
    async fn interest_over_time(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
    ) -> Result<RecordBatch> {
        let phrases = &phrases[..phrases.len().min(MAX_PHRASES_PER_REQUEST)];
        let widget = self.explore(phrases, timeframe, TIMESERIES_WIDGET).await?;
        let timeline: TimelineResponse = self
            .widget_data(MULTILINE_URL, &widget.request, &widget.token)
            .await?;
        table::timeline_batch(phrases, timeline.points())
    }

    async fn interest_by_region(
        &mut self,
        phrases: &[String],
        timeframe: Timeframe,
    ) -> Result<RecordBatch> {
        let phrases = &phrases[..phrases.len().min(MAX_PHRASES_PER_REQUEST)];
        let widget = self.explore(phrases, timeframe, GEO_MAP_WIDGET).await?;

        let mut request = widget.request.clone();
        if let Some(fields) = request.as_object_mut() {
            // Country resolution only applies to worldwide queries.
            if self.geo.is_empty() {
                fields.insert("resolution".to_string(), json!("COUNTRY"));
            }
            fields.insert("includeLowSearchVolumeGeos".to_string(), json!(false));
        }

        let geo: GeoMapResponse = self
            .widget_data(COMPARED_GEO_URL, &request, &widget.token)
            .await?;
        table::region_batch(phrases, geo.entries())
    }

    async fn related_queries(
        &mut self,
        phrase: &str,
        timeframe: Timeframe,
    ) -> Result<RelatedQueries> {
        let phrases = [phrase.to_string()];
        let widget = self.explore(&phrases, timeframe, RELATED_QUERIES_WIDGET).await?;
        let related: RelatedSearchesResponse = self
            .widget_data(RELATED_SEARCHES_URL, &widget.request, &widget.token)
            .await?;

        let convert = |keywords: &[RankedKeyword]| {
            keywords
                .iter()
                .map(|k| RelatedQuery {
                    query: k.query.clone(),
                    value: k.value,
                })
                .collect::<Vec<_>>()
        };

        Ok(RelatedQueries {
            top: convert(related.top()),
            rising: convert(related.rising()),
        })
    }

    async fn reinitialize(&mut self, identity: &str) -> Result<()> {
        self.http = build_http(identity)?;
        self.cookie = None;
        debug!(identity, "Rebuilt trends client");
        Ok(())
    }
}

fn emulation_for(identity: &str) -> Result<Emulation> {
    match identity {
        "chrome_131" => Ok(Emulation::Chrome131),
        "edge_131" => Ok(Emulation::Edge131),
        "firefox_133" => Ok(Emulation::Firefox133),
        "safari_18" => Ok(Emulation::Safari18),
        other => Err(Error::InvalidInput(format!("unknown browser identity: {}", other))),
    }
}

fn build_http(identity: &str) -> Result<rquest::Client> {
    let emulation = emulation_for(identity)?;
    Ok(rquest::Client::builder().emulation(emulation).build()?)
}

/// Drops the anti-JSON-hijacking prefix (`)]}'`) Google puts before every body.
fn strip_guard(body: &str) -> &str {
    body.find('{').map(|idx| &body[idx..]).unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::IDENTITY_POOL;

    fn config() -> TrendsConfig {
        TrendsConfig {
            geo: "RU".to_string(),
            category: 13,
            language: "ru-RU".to_string(),
            tz_offset: 180,
        }
    }

    #[test]
    fn test_strip_guard() {
        assert_eq!(strip_guard(")]}'\n{\"widgets\":[]}"), "{\"widgets\":[]}");
        assert_eq!(strip_guard(")]}',\n{\"default\":{}}"), "{\"default\":{}}");
        assert_eq!(strip_guard("{}"), "{}");
    }

    #[test]
    fn test_every_pooled_identity_has_emulation() {
        for identity in IDENTITY_POOL {
            assert!(emulation_for(identity).is_ok(), "{identity}");
        }
        assert!(matches!(emulation_for("netscape_4"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_explore_url_caps_phrases() {
        let client = GoogleTrendsClient::new(&config(), "chrome_131").unwrap();
        let phrases: Vec<String> = (1..=7).map(|i| format!("vpn {i}")).collect();
        let url = client.explore_url(&phrases, Timeframe::ThreeMonths).unwrap();

        let req = url
            .query_pairs()
            .find(|(k, _)| k == "req")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        let req: Value = serde_json::from_str(&req).unwrap();
        let items = req["comparisonItem"].as_array().unwrap();
        assert_eq!(items.len(), MAX_PHRASES_PER_REQUEST);
        assert_eq!(items[0]["time"], "today 3-m");
        assert_eq!(items[0]["geo"], "RU");
        assert_eq!(req["category"], 13);
    }
}
