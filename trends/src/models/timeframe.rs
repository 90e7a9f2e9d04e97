use serde::Serialize;
use std::fmt;

/// Historical window requested from the upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Timeframe {
    #[serde(rename = "1_month")]
    OneMonth,
    #[serde(rename = "3_months")]
    ThreeMonths,
}

impl Timeframe {
    /// Every timeframe, in collection order.
    pub const ALL: [Timeframe; 2] = [Timeframe::OneMonth, Timeframe::ThreeMonths];

    /// Range token understood by the upstream API.
    pub fn token(self) -> &'static str {
        match self {
            Timeframe::OneMonth => "today 1-m",
            Timeframe::ThreeMonths => "today 3-m",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Timeframe::OneMonth => "1_month",
            Timeframe::ThreeMonths => "3_months",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_tokens() {
        assert_eq!(Timeframe::OneMonth.token(), "today 1-m");
        assert_eq!(Timeframe::ThreeMonths.token(), "today 3-m");
        assert_eq!(Timeframe::ThreeMonths.key(), "3_months");
        assert_eq!(
            serde_json::to_string(&Timeframe::OneMonth).unwrap(),
            "\"1_month\""
        );
    }
}
