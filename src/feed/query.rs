use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sort mode of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchSort {
    #[default]
    Recent,
    Popular,
}

/// Creation-date window of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPeriod {
    #[default]
    All,
    Month,
    Week,
}

impl SearchSort {
    pub const ALL: [SearchSort; 2] = [SearchSort::Recent, SearchSort::Popular];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::Popular => "popular",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Recent => "Recent",
            Self::Popular => "Popular",
        }
    }
}

impl SearchPeriod {
    pub const ALL: [SearchPeriod; 3] = [SearchPeriod::All, SearchPeriod::Month, SearchPeriod::Week];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Month => "month",
            Self::Week => "week",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All time",
            Self::Month => "Past month",
            Self::Week => "Past week",
        }
    }

    /// Length of the window in days, `None` for no limit.
    pub fn days(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Month => Some(30),
            Self::Week => Some(7),
        }
    }
}

/// A stored sort or period name that no variant matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

impl FromStr for SearchSort {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl FromStr for SearchPeriod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// What to fetch: a tag (empty for the global feed) plus sort and period.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedQuery {
    pub tag: String,
    pub sort: SearchSort,
    pub period: SearchPeriod,
}

impl FeedQuery {
    pub fn new(tag: impl Into<String>, sort: SearchSort, period: SearchPeriod) -> Self {
        Self {
            tag: tag.into().trim().to_string(),
            sort,
            period,
        }
    }

    /// Shorthand for a recent, all-time query on `tag`.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::new(tag, SearchSort::default(), SearchPeriod::default())
    }
}

impl fmt::Display for FeedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.tag.is_empty() { "all" } else { &self.tag };
        write!(f, "{} ({}, {})", tag, self.sort.label(), self.period.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_stored_values() {
        assert_eq!("recent".parse::<SearchSort>(), Ok(SearchSort::Recent));
        assert_eq!("popular".parse::<SearchSort>(), Ok(SearchSort::Popular));
        assert!("hot".parse::<SearchSort>().is_err());
    }

    #[test]
    fn test_unknown_value_message() {
        let err = "hot".parse::<SearchSort>().unwrap_err();
        assert_eq!(err, UnknownVariant("hot".into()));
        assert_eq!(err.to_string(), "unknown value 'hot'");
    }

    #[test]
    fn test_period_parses_stored_values() {
        for period in SearchPeriod::ALL {
            assert_eq!(period.as_str().parse::<SearchPeriod>(), Ok(period));
        }
        assert!("year".parse::<SearchPeriod>().is_err());
    }

    #[test]
    fn test_query_trims_tag() {
        let q = FeedQuery::tag("  swift ");
        assert_eq!(q.tag, "swift");
        assert_eq!(q.sort, SearchSort::Recent);
        assert_eq!(q.period, SearchPeriod::All);
    }

    #[test]
    fn test_display() {
        let q = FeedQuery::new("rust", SearchSort::Popular, SearchPeriod::Week);
        assert_eq!(q.to_string(), "rust (Popular, Past week)");
        assert_eq!(FeedQuery::default().to_string(), "all (Recent, All time)");
    }
}
