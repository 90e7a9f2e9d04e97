mod response;
mod result;
mod timeframe;

pub use response::{
    ExploreResponse, GeoMapEntry, RankedKeyword, RelatedSearchesResponse, TimelinePoint,
    TimelineResponse, Widget, GeoMapResponse,
};
pub use result::{
    CountryResult, InterestSeries, PeriodResult, RelatedQueries, RelatedQuery,
};
pub use timeframe::Timeframe;
