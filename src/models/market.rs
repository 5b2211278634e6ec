//! Market identifiers and chart parameters accepted by the query layer.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AppError;

// == Market ==
/// Exchange whose composite index can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Kospi,
    Kosdaq,
}

impl Market {
    pub const ALL: [Market; 2] = [Market::Kospi, Market::Kosdaq];

    pub const fn as_str(self) -> &'static str {
        match self {
            Market::Kospi => "KOSPI",
            Market::Kosdaq => "KOSDAQ",
        }
    }

    /// Upstream index code.
    pub const fn code(self) -> &'static str {
        match self {
            Market::Kospi => "0001",
            Market::Kosdaq => "1001",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "KOSPI" => Ok(Market::Kospi),
            "KOSDAQ" => Ok(Market::Kosdaq),
            _ => Err(AppError::InvalidRequest(format!(
                "Invalid market: {value}. Must be KOSPI or KOSDAQ"
            ))),
        }
    }
}

// == Market Selection ==
/// One market or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketSelection {
    One(Market),
    All,
}

impl MarketSelection {
    pub fn markets(self) -> Vec<Market> {
        match self {
            MarketSelection::One(market) => vec![market],
            MarketSelection::All => Market::ALL.to_vec(),
        }
    }
}

impl FromStr for MarketSelection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("ALL") {
            return Ok(MarketSelection::All);
        }
        value.parse().map(MarketSelection::One).map_err(|_| {
            AppError::InvalidRequest(format!(
                "Invalid market: {value}. Must be KOSPI, KOSDAQ, or ALL"
            ))
        })
    }
}

// == Chart Period ==
/// Look-back window of a chart query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartPeriod {
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
    OneYear,
}

impl ChartPeriod {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChartPeriod::OneDay => "1D",
            ChartPeriod::OneWeek => "1W",
            ChartPeriod::OneMonth => "1M",
            ChartPeriod::ThreeMonths => "3M",
            ChartPeriod::OneYear => "1Y",
        }
    }

    /// Upstream period division code. 1M and 3M share the monthly series.
    pub const fn code(self) -> &'static str {
        match self {
            ChartPeriod::OneDay => "D",
            ChartPeriod::OneWeek => "W",
            ChartPeriod::OneMonth | ChartPeriod::ThreeMonths => "M",
            ChartPeriod::OneYear => "Y",
        }
    }
}

impl FromStr for ChartPeriod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(ChartPeriod::OneDay),
            "1W" => Ok(ChartPeriod::OneWeek),
            "1M" => Ok(ChartPeriod::OneMonth),
            "3M" => Ok(ChartPeriod::ThreeMonths),
            "1Y" => Ok(ChartPeriod::OneYear),
            _ => Err(AppError::InvalidRequest(format!(
                "Invalid period: {value}. Must be one of 1D, 1W, 1M, 3M, 1Y"
            ))),
        }
    }
}

// == Chart Interval ==
/// Bar width of a chart query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartInterval {
    OneMinute,
    FiveMinutes,
    ThirtyMinutes,
    OneHour,
    OneDay,
}

impl ChartInterval {
    pub const fn as_str(self) -> &'static str {
        match self {
            ChartInterval::OneMinute => "1m",
            ChartInterval::FiveMinutes => "5m",
            ChartInterval::ThirtyMinutes => "30m",
            ChartInterval::OneHour => "1h",
            ChartInterval::OneDay => "1d",
        }
    }
}

impl FromStr for ChartInterval {
    type Err = AppError;

    // Case matters here: "1m" is a minute, "1M" would be a month.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "1m" => Ok(ChartInterval::OneMinute),
            "5m" => Ok(ChartInterval::FiveMinutes),
            "30m" => Ok(ChartInterval::ThirtyMinutes),
            "1h" => Ok(ChartInterval::OneHour),
            "1d" => Ok(ChartInterval::OneDay),
            _ => Err(AppError::InvalidRequest(format!(
                "Invalid interval: {value}. Must be one of 1m, 5m, 30m, 1h, 1d"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_parse() {
        assert_eq!("kospi".parse::<Market>().unwrap(), Market::Kospi);
        assert_eq!(" KOSDAQ ".parse::<Market>().unwrap(), Market::Kosdaq);
        assert!("NASDAQ".parse::<Market>().is_err());
        assert!("ALL".parse::<Market>().is_err());
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!("all".parse::<MarketSelection>().unwrap(), MarketSelection::All);
        assert_eq!(
            "KOSPI".parse::<MarketSelection>().unwrap(),
            MarketSelection::One(Market::Kospi)
        );
        assert_eq!(MarketSelection::All.markets(), vec![Market::Kospi, Market::Kosdaq]);

        let err = "NYSE".parse::<MarketSelection>().unwrap_err();
        assert!(err.to_string().contains("KOSPI, KOSDAQ, or ALL"));
    }

    #[test]
    fn test_market_codes() {
        assert_eq!(Market::Kospi.code(), "0001");
        assert_eq!(Market::Kosdaq.code(), "1001");
    }

    #[test]
    fn test_period_codes() {
        assert_eq!("1d".parse::<ChartPeriod>().unwrap().code(), "D");
        assert_eq!("1M".parse::<ChartPeriod>().unwrap().code(), "M");
        assert_eq!("3M".parse::<ChartPeriod>().unwrap().code(), "M");
        assert_eq!(ChartPeriod::OneYear.as_str(), "1Y");
        assert!("2W".parse::<ChartPeriod>().is_err());
    }

    #[test]
    fn test_interval_parse_is_case_sensitive() {
        assert_eq!("5m".parse::<ChartInterval>().unwrap(), ChartInterval::FiveMinutes);
        assert!("5M".parse::<ChartInterval>().is_err());
        assert!("2h".parse::<ChartInterval>().is_err());
    }

    #[test]
    fn test_market_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Market::Kosdaq).unwrap(), "\"KOSDAQ\"");
    }
}
