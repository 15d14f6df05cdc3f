//! Time-series points and the builders for each measurement

use crate::octopus::types::Consumption;
use crate::peak::{BandUsage, PriceType};
use crate::tariff::round_to;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const ELECTRICITY_CONSUMPTION: &str = "electricity_consumption";
pub const ELECTRICITY_EXPORT: &str = "electricity_export";
pub const GAS_CONSUMPTION: &str = "gas_consumption";
pub const ELECTRICITY_MONTHLY_CONSUMPTION: &str = "electricity_monthly_consumption";
pub const ELECTRICITY_MONTHLY_EXPORT: &str = "electricity_monthly_export";
pub const GAS_MONTHLY_CONSUMPTION: &str = "gas_monthly_consumption";
pub const PEAK_OFFPEAK_DAILY: &str = "electricity_peak_offpeak_daily";
pub const PEAK_OFFPEAK_MONTHLY: &str = "electricity_peak_offpeak_monthly";
pub const DAILY_ELECTRICITY_COST: &str = "daily_electricity_cost";
pub const DAILY_EXPORT_GAIN: &str = "daily_export_gain";

const ACCOUNT_TAG: &str = "account_number";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// One time-series point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub time: DateTime<Utc>,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Point {
    pub fn new(measurement: &str, time: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.to_string(),
            time,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Timestamp in nanoseconds since the epoch (0 when out of range)
    pub fn timestamp_nanos(&self) -> i64 {
        self.time.timestamp_nanos_opt().unwrap_or_default()
    }

    /// InfluxDB line protocol, nanosecond precision
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);
        for (k, v) in &self.tags {
            let _ = write!(line, ",{}={}", escape_key(k), escape_key(v));
        }
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    FieldValue::Float(f) => format!("{}", f),
                    FieldValue::Integer(i) => format!("{}i", i),
                    FieldValue::Text(s) => format!("\"{}\"", escape(s, &['"', '\\'])),
                };
                format!("{}={}", escape_key(k), value)
            })
            .collect();
        let _ = write!(line, " {} {}", fields.join(","), self.timestamp_nanos());
        line
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

/// Local wall-clock time stored as if it were UTC, so day and month points
/// land on local midnight
pub fn wall_clock(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.naive_local())
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

fn month_label(day: NaiveDate) -> String {
    day.format("%b %Y").to_string()
}

/// `consumption` and `month` per record
pub fn consumption_points(records: &[Consumption], measurement: &str, account: &str) -> Vec<Point> {
    records
        .iter()
        .map(|r| {
            Point::new(measurement, wall_clock(r.interval_start))
                .tag(ACCOUNT_TAG, account)
                .field("consumption", r.consumption)
                .field("month", month_label(r.interval_start.date_naive()))
        })
        .collect()
}

/// Like [`consumption_points`], skipping partial months
pub fn monthly_points(records: &[Consumption], measurement: &str, account: &str) -> Vec<Point> {
    let full: Vec<Consumption> = records
        .iter()
        .filter(|r| r.interval_start.day() == 1)
        .cloned()
        .collect();
    consumption_points(&full, measurement, account)
}

/// Non-zero bands per bucket, tagged by year and month
pub fn band_points(
    usage: &BTreeMap<DateTime<FixedOffset>, BandUsage>,
    measurement: &str,
    account: &str,
) -> Vec<Point> {
    usage
        .iter()
        .filter_map(|(bucket, bands)| {
            let mut point = Point::new(measurement, wall_clock(*bucket))
                .tag(ACCOUNT_TAG, account)
                .tag("year", bucket.format("%Y").to_string())
                .tag("month", bucket.format("%Y %m").to_string());
            for band in [PriceType::Standard, PriceType::Peak, PriceType::OffPeak] {
                let value = bands.get(band);
                if value != 0.0 {
                    point = point.field(band.field_name(), round_to(value, 2));
                }
            }
            (!point.fields.is_empty()).then_some(point)
        })
        .collect()
}

/// Day cost plus standing charge, truncated to whole pence
pub fn cost_points(costs: &BTreeMap<NaiveDate, f64>, standing_charge: f64, account: &str) -> Vec<Point> {
    costs
        .iter()
        .map(|(day, cost)| {
            Point::new(DAILY_ELECTRICITY_COST, midnight(*day))
                .tag(ACCOUNT_TAG, account)
                .field("cost", (cost + standing_charge).trunc() as i64)
                .field("month", month_label(*day))
        })
        .collect()
}

pub fn gain_points(gains: &BTreeMap<NaiveDate, f64>, account: &str) -> Vec<Point> {
    gains
        .iter()
        .map(|(day, gain)| {
            Point::new(DAILY_EXPORT_GAIN, midnight(*day))
                .tag(ACCOUNT_TAG, account)
                .field("gain", gain.trunc() as i64)
                .field("month", month_label(*day))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_protocol_escapes_and_types() {
        let time = "2024-01-01T00:00:00Z".parse().unwrap();
        let point = Point::new("daily cost", time)
            .tag("account_number", "A-1")
            .field("peak consumption", 1.5)
            .field("cost", 42i64)
            .field("month", "Jan \"24\"");
        assert_eq!(
            point.to_line_protocol(),
            "daily\\ cost,account_number=A-1 cost=42i,month=\"Jan \\\"24\\\"\",peak\\ consumption=1.5 1704067200000000000"
        );
    }

    #[test]
    fn wall_clock_keeps_local_midnight() {
        let local = DateTime::parse_from_rfc3339("2024-06-01T00:00:00+01:00").unwrap();
        assert_eq!(wall_clock(local).to_rfc3339(), "2024-06-01T00:00:00+00:00");
    }

    #[test]
    fn month_labels() {
        let day = NaiveDate::from_ymd_opt(2023, 9, 14).unwrap();
        assert_eq!(month_label(day), "Sep 2023");
    }
}
