//! Peak/off-peak classification of priced consumption

use crate::config::PeakConfig;
use crate::error::{OctologError, Result};
use crate::octopus::types::Rate;
use crate::tariff::{PriceBasis, PricedInterval, round_to};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriceType {
    Standard,
    Peak,
    OffPeak,
}

impl PriceType {
    pub fn label(&self) -> &'static str {
        match self {
            PriceType::Standard => "Standard",
            PriceType::Peak => "Peak",
            PriceType::OffPeak => "OffPeak",
        }
    }

    /// Field name used when writing band usage
    pub fn field_name(&self) -> &'static str {
        match self {
            PriceType::Standard => "standard consumption",
            PriceType::Peak => "peak consumption",
            PriceType::OffPeak => "offpeak consumption",
        }
    }
}

impl std::fmt::Display for PriceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub trait Classifier {
    /// Band of an interval, `None` when it cannot be placed in one
    fn classify(&self, interval: &PricedInterval) -> Option<PriceType>;
}

/// Off-peak inside a fixed local time window, peak outside it
#[derive(Debug, Clone)]
pub struct TimeOfDayClassifier {
    pub off_peak_start: NaiveTime,
    pub off_peak_end: NaiveTime,
    pub timezone: Tz,
}

impl TimeOfDayClassifier {
    pub fn new(off_peak_start: NaiveTime, off_peak_end: NaiveTime, timezone: Tz) -> Self {
        Self {
            off_peak_start,
            off_peak_end,
            timezone,
        }
    }

    fn in_window(&self, t: NaiveTime) -> bool {
        if self.off_peak_start <= self.off_peak_end {
            self.off_peak_start <= t && t < self.off_peak_end
        } else {
            // wraps midnight
            t >= self.off_peak_start || t < self.off_peak_end
        }
    }
}

impl Classifier for TimeOfDayClassifier {
    fn classify(&self, interval: &PricedInterval) -> Option<PriceType> {
        let local = interval.interval_start.with_timezone(&self.timezone).time();
        if self.in_window(local) {
            Some(PriceType::OffPeak)
        } else {
            Some(PriceType::Peak)
        }
    }
}

/// Labels each day's distinct unit prices by rank
#[derive(Debug, Clone, Default)]
pub struct PriceTierClassifier {
    tiers: BTreeMap<NaiveDate, Vec<(f64, PriceType)>>,
}

const PRICE_EPSILON: f64 = 1e-9;

impl PriceTierClassifier {
    pub fn from_rates(rates: &[Rate], basis: PriceBasis) -> Self {
        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for rate in rates {
            let Some(from) = rate.valid_from else {
                continue;
            };
            let prices = by_day.entry(from.date_naive()).or_default();
            let price = basis.price_of(rate);
            if !prices.iter().any(|p| (p - price).abs() < PRICE_EPSILON) {
                prices.push(price);
            }
        }

        let tiers = by_day
            .into_iter()
            .map(|(day, mut prices)| {
                prices.sort_by(f64::total_cmp);
                (day, label_prices(&prices))
            })
            .collect();
        Self { tiers }
    }

    /// Labelled prices of a day, ascending
    pub fn tiers_for(&self, day: NaiveDate) -> Option<&[(f64, PriceType)]> {
        self.tiers.get(&day).map(Vec::as_slice)
    }

    pub fn days(&self) -> usize {
        self.tiers.len()
    }

    pub fn label(&self, day: NaiveDate, price: f64) -> PriceType {
        self.tiers_for(day)
            .and_then(|tiers| {
                tiers
                    .iter()
                    .find(|(p, _)| (p - price).abs() < PRICE_EPSILON)
                    .map(|(_, t)| *t)
            })
            .unwrap_or(PriceType::Standard)
    }
}

fn label_prices(sorted: &[f64]) -> Vec<(f64, PriceType)> {
    let n = sorted.len();
    sorted
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let tier = match n {
                1 => PriceType::Standard,
                _ if i == 0 => PriceType::OffPeak,
                _ if i == n - 1 => PriceType::Peak,
                _ => PriceType::Standard,
            };
            (*price, tier)
        })
        .collect()
}

impl Classifier for PriceTierClassifier {
    /// Unpriced intervals have no tier
    fn classify(&self, interval: &PricedInterval) -> Option<PriceType> {
        let price = interval.unit_price?;
        // tiers are keyed by the day the rate window starts
        let day = interval
            .rate_from
            .unwrap_or_else(|| interval.interval_start.with_timezone(&Utc))
            .date_naive();
        Some(self.label(day, price))
    }
}

/// Classifier selected by configuration
#[derive(Debug, Clone)]
pub enum PeakMode {
    Price(PriceTierClassifier),
    Time(TimeOfDayClassifier),
}

impl PeakMode {
    /// `rates` are only used by the price classifier
    pub fn from_config(config: &PeakConfig, tz: Tz, rates: &[Rate], basis: PriceBasis) -> Result<Self> {
        match config.classifier.as_str() {
            "price" => Ok(PeakMode::Price(PriceTierClassifier::from_rates(rates, basis))),
            "time" => {
                let (start, end) = config.off_peak_window()?;
                Ok(PeakMode::Time(TimeOfDayClassifier::new(start, end, tz)))
            }
            other => Err(OctologError::validation(
                "peak.classifier",
                format!("Unknown classifier '{}'", other),
            )),
        }
    }

    pub fn needs_rates(config: &PeakConfig) -> bool {
        config.classifier == "price"
    }
}

impl Classifier for PeakMode {
    fn classify(&self, interval: &PricedInterval) -> Option<PriceType> {
        match self {
            PeakMode::Price(c) => c.classify(interval),
            PeakMode::Time(c) => c.classify(interval),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Day,
    Month,
}

impl Bucket {
    /// Midnight of the day or of the first of the month, in the interval's offset
    pub fn key(&self, start: DateTime<chrono::FixedOffset>) -> DateTime<chrono::FixedOffset> {
        let date = start.date_naive();
        let date = match self {
            Bucket::Day => date,
            Bucket::Month => date.with_day(1).unwrap_or(date),
        };
        date.and_time(NaiveTime::MIN)
            .and_local_timezone(*start.offset())
            .single()
            .unwrap_or(start)
    }
}

/// Consumption per band, rounded to 2 decimals as it accumulates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandUsage {
    pub standard: f64,
    pub peak: f64,
    pub off_peak: f64,
}

impl BandUsage {
    pub fn add(&mut self, band: PriceType, consumption: f64) {
        let slot = match band {
            PriceType::Standard => &mut self.standard,
            PriceType::Peak => &mut self.peak,
            PriceType::OffPeak => &mut self.off_peak,
        };
        *slot = round_to(*slot + consumption, 2);
    }

    pub fn get(&self, band: PriceType) -> f64 {
        match band {
            PriceType::Standard => self.standard,
            PriceType::Peak => self.peak,
            PriceType::OffPeak => self.off_peak,
        }
    }

    pub fn total(&self) -> f64 {
        self.standard + self.peak + self.off_peak
    }
}

/// Intervals [`usage_by_band`] leaves out
pub fn unclassified<C: Classifier + ?Sized>(priced: &[PricedInterval], classifier: &C) -> usize {
    priced
        .iter()
        .filter(|i| classifier.classify(i).is_none())
        .count()
}

pub fn usage_by_band<C: Classifier + ?Sized>(
    priced: &[PricedInterval],
    classifier: &C,
    bucket: Bucket,
) -> BTreeMap<DateTime<chrono::FixedOffset>, BandUsage> {
    let mut usage: BTreeMap<_, BandUsage> = BTreeMap::new();
    for interval in priced {
        let Some(band) = classifier.classify(interval) else {
            continue;
        };
        usage
            .entry(bucket.key(interval.interval_start))
            .or_default()
            .add(band, interval.consumption);
    }
    usage
}
