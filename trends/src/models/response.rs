
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ExploreResponse {
    #[serde(default)]
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(default)]
    pub request: Value,
    #[serde(default)]
    pub token: String,
}

impl ExploreResponse {
    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }
}

#[derive(Debug, Deserialize)]
pub struct TimelineResponse {
    default: TimelineDefault,
}

#[derive(Debug, Deserialize)]
struct TimelineDefault {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    /// Unix seconds, sent as a string.
    pub time: String,
    #[serde(default)]
    pub value: Vec<f64>,
    #[serde(default)]
    pub is_partial: bool,
}

impl TimelineResponse {
    pub fn points(&self) -> &[TimelinePoint] {
        &self.default.timeline_data
    }
}

#[derive(Debug, Deserialize)]
pub struct GeoMapResponse {
    default: GeoMapDefault,
}

#[derive(Debug, Deserialize)]
struct GeoMapDefault {
    #[serde(rename = "geoMapData", default)]
    geo_map_data: Vec<GeoMapEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoMapEntry {
    #[serde(default)]
    pub geo_code: String,
    pub geo_name: String,
    #[serde(default)]
    pub value: Vec<f64>,
}

impl GeoMapResponse {
    pub fn entries(&self) -> &[GeoMapEntry] {
        &self.default.geo_map_data
    }
}

#[derive(Debug, Deserialize)]
pub struct RelatedSearchesResponse {
    default: RelatedDefault,
}

#[derive(Debug, Deserialize)]
struct RelatedDefault {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankedKeyword {
    pub query: String,
    #[serde(default)]
    pub value: f64,
}

impl RelatedSearchesResponse {
    /// Keywords of the "top" list (first ranked list).
    pub fn top(&self) -> &[RankedKeyword] {
        self.ranked(0)
    }

    /// Keywords of the "rising" list (second ranked list).
    pub fn rising(&self) -> &[RankedKeyword] {
        self.ranked(1)
    }

    fn ranked(&self, index: usize) -> &[RankedKeyword] {
        self.default
            .ranked_list
            .get(index)
            .map(|list| list.ranked_keyword.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_parses_partial_marker() {
        let body = r#"{"default":{"timelineData":[
            {"time":"1700000000","formattedTime":"Nov 14","value":[10,20],"hasData":[true,true]},
            {"time":"1700086400","formattedTime":"Nov 15","value":[30,0],"hasData":[true,false],"isPartial":true}
        ],"averages":[]}}"#;
        let parsed: TimelineResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.points().len(), 2);
        assert!(!parsed.points()[0].is_partial);
        assert!(parsed.points()[1].is_partial);
        assert_eq!(parsed.points()[1].value, vec![30.0, 0.0]);
    }

    #[test]
    fn test_related_lists_split() {
        let body = r#"{"default":{"rankedList":[
            {"rankedKeyword":[{"query":"vpn turkey free","value":100,"formattedValue":"100"}]},
            {"rankedKeyword":[{"query":"turkey vpn app","value":250,"formattedValue":"+250%"}]}
        ]}}"#;
        let parsed: RelatedSearchesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.top()[0].query, "vpn turkey free");
        assert_eq!(parsed.rising()[0].value, 250.0);
    }

    #[test]
    fn test_missing_rising_list_is_empty() {
        let parsed: RelatedSearchesResponse =
            serde_json::from_str(r#"{"default":{"rankedList":[]}}"#).unwrap();
        assert!(parsed.top().is_empty());
        assert!(parsed.rising().is_empty());
    }
}
