//! Immutable request parameters

use crate::error::{OctologError, Result};
use crate::octopus::endpoint::{Endpoint, Param};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Format used for timestamps in query strings
pub const API_TIME_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

pub fn format_api_time(at: DateTime<Utc>) -> String {
    at.format(API_TIME_FORMAT).to_string()
}

/// Closed time range `[from, to]` sent as `period_from`/`period_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Period {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Midnight `ago` days before `today`, lasting `days` days minus five minutes
    pub fn days_ago(today: NaiveDate, ago: u32, days: u32) -> Result<Self> {
        let out_of_range = || {
            OctologError::validation("days", format!("{} days before {} is out of range", ago, today))
        };
        let start_date = today
            .checked_sub_signed(Duration::days(i64::from(ago)))
            .ok_or_else(out_of_range)?;
        let from = Utc.from_utc_datetime(&start_date.and_time(chrono::NaiveTime::MIN));
        let to = from
            .checked_add_signed(Duration::days(i64::from(days)) - Duration::minutes(5))
            .ok_or_else(out_of_range)?;
        Ok(Self { from, to })
    }

    /// From midnight on the first day of the month before `today`, up to
    /// the end of `today`
    pub fn since_last_month(today: NaiveDate) -> Result<Self> {
        let (year, month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today);
        let ago = (today - first).num_days().max(0) as u32;
        Self::days_ago(today, ago, ago + 1)
    }

    /// Window of `radius` either side of `at`
    pub fn around(at: DateTime<Utc>, radius: Duration) -> Self {
        Self {
            from: at - radius,
            to: at + radius,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Hour,
    Day,
    Week,
    Month,
    Quarter,
}

impl Grouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grouping::Hour => "hour",
            Grouping::Day => "day",
            Grouping::Week => "week",
            Grouping::Month => "month",
            Grouping::Quarter => "quarter",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Oldest,
    Newest,
}

impl Ordering {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ordering::Oldest => "period",
            Ordering::Newest => "-period",
        }
    }
}

/// Filters accepted by the product catalogue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub is_variable: Option<bool>,
    pub is_green: Option<bool>,
    pub is_tracker: Option<bool>,
    pub is_prepay: Option<bool>,
    pub is_business: Option<bool>,
    pub available_at: Option<DateTime<Utc>>,
}

/// Parameters of a single request
///
/// Built with consuming setters; the values an endpoint does not accept are
/// left out of the query string by [`Query::pairs_for`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub page_size: Option<u32>,
    pub period: Option<Period>,
    pub group_by: Option<Grouping>,
    pub order_by: Option<Ordering>,
    pub active_at: Option<DateTime<Utc>>,
    pub postcode: Option<String>,
    pub filter: ProductFilter,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn group_by(mut self, grouping: Grouping) -> Self {
        self.group_by = Some(grouping);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.order_by = Some(ordering);
        self
    }

    pub fn active_at(mut self, at: DateTime<Utc>) -> Self {
        self.active_at = Some(at);
        self
    }

    pub fn postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = Some(postcode.into());
        self
    }

    pub fn filter(mut self, filter: ProductFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Value of one parameter, if set
    fn value(&self, param: Param) -> Option<String> {
        let flag = |b: Option<bool>| b.map(|v| v.to_string());
        match param {
            Param::PageSize => self.page_size.map(|s| s.to_string()),
            Param::PeriodFrom => self.period.map(|p| format_api_time(p.from)),
            Param::PeriodTo => self.period.map(|p| format_api_time(p.to)),
            Param::OrderBy => self.order_by.map(|o| o.as_str().to_string()),
            Param::GroupBy => self.group_by.map(|g| g.as_str().to_string()),
            Param::TariffsActiveAt => self.active_at.map(format_api_time),
            Param::Postcode => self.postcode.clone(),
            Param::IsVariable => flag(self.filter.is_variable),
            Param::IsGreen => flag(self.filter.is_green),
            Param::IsTracker => flag(self.filter.is_tracker),
            Param::IsPrepay => flag(self.filter.is_prepay),
            Param::IsBusiness => flag(self.filter.is_business),
            Param::AvailableAt => self.filter.available_at.map(format_api_time),
        }
    }

    /// Query string pairs for `endpoint`, in the endpoint's parameter order
    pub fn pairs_for(&self, endpoint: &Endpoint) -> Vec<(&'static str, String)> {
        endpoint
            .params()
            .iter()
            .filter_map(|p| self.value(*p).map(|v| (p.as_str(), v)))
            .collect()
    }
}
