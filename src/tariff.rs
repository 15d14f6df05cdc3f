//! Tariff matching
//!
//! Pairs every consumption interval with the unit rate in force when the
//! interval starts and accumulates cost per calendar day. Both inputs are
//! walked once, in ascending order, with a cursor that never moves back.

use crate::octopus::types::{Consumption, Rate};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which published price to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    #[default]
    IncVat,
    ExcVat,
}

impl PriceBasis {
    pub fn price_of(&self, rate: &Rate) -> f64 {
        match self {
            PriceBasis::IncVat => rate.value_inc_vat,
            PriceBasis::ExcVat => rate.value_exc_vat,
        }
    }
}

/// Payment method Octopus uses for its direct debit windows
pub const DIRECT_DEBIT: &str = "DIRECT_DEBIT";

/// Keep the direct debit windows when a tariff publishes one per payment method
///
/// Windows without a payment method apply to everyone and are always kept.
pub fn prefer_direct_debit(rates: Vec<Rate>) -> Vec<Rate> {
    let has_direct_debit = rates
        .iter()
        .any(|r| r.payment_method.as_deref() == Some(DIRECT_DEBIT));
    if !has_direct_debit {
        return rates;
    }
    rates
        .into_iter()
        .filter(|r| r.payment_method.as_deref().is_none_or(|m| m == DIRECT_DEBIT))
        .collect()
}

/// Round half away from zero to `places` decimals
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Forward-only position in a list of rates sorted by `valid_from`
#[derive(Debug)]
pub struct RateCursor<'a> {
    rates: &'a [Rate],
    pos: usize,
}

impl<'a> RateCursor<'a> {
    /// `rates` must be sorted ascending by `valid_from`
    pub fn new(rates: &'a [Rate]) -> Self {
        Self { rates, pos: 0 }
    }

    /// Rate in force at `start`
    ///
    /// Skips windows that ended at or before `start`. A lookup earlier than
    /// the current window does not rewind and yields `None`.
    pub fn rate_for(&mut self, start: DateTime<Utc>) -> Option<&'a Rate> {
        while let Some(rate) = self.rates.get(self.pos) {
            match rate.valid_to {
                Some(to) if to <= start => self.pos += 1,
                _ => break,
            }
        }
        self.rates
            .get(self.pos)
            .filter(|rate| rate.is_effective_at(start))
    }
}

/// A consumption interval with the unit price it was billed at
#[derive(Debug, Clone, PartialEq)]
pub struct PricedInterval {
    pub interval_start: DateTime<FixedOffset>,
    pub interval_end: DateTime<FixedOffset>,
    pub consumption: f64,
    /// Pence per unit, `None` when no rate covered the interval
    pub unit_price: Option<f64>,
    /// Start of the rate window that priced the interval
    pub rate_from: Option<DateTime<Utc>>,
}

impl PricedInterval {
    /// Cost in pence: `round(round(consumption, 2) * price, 3)`
    pub fn cost(&self) -> Option<f64> {
        self.unit_price
            .map(|price| round_to(round_to(self.consumption, 2) * price, 3))
    }

    /// Calendar day of the interval start, in its own offset
    pub fn day(&self) -> NaiveDate {
        self.interval_start.date_naive()
    }
}

fn sort_key(rate: &Rate) -> DateTime<Utc> {
    rate.valid_from.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Assign a unit price to every consumption interval
pub fn match_rates(rates: &[Rate], consumption: &[Consumption], basis: PriceBasis) -> Vec<PricedInterval> {
    let mut rates = rates.to_vec();
    rates.sort_by_key(sort_key);
    let mut records = consumption.to_vec();
    records.sort_by_key(|c| c.interval_start);

    let mut cursor = RateCursor::new(&rates);
    records
        .into_iter()
        .map(|c| {
            let rate = cursor.rate_for(c.interval_start.with_timezone(&Utc));
            PricedInterval {
                interval_start: c.interval_start,
                interval_end: c.interval_end,
                consumption: c.consumption,
                unit_price: rate.map(|r| basis.price_of(r)),
                rate_from: rate.and_then(|r| r.valid_from),
            }
        })
        .collect()
}

/// Per-day cost of a set of priced intervals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostReport {
    pub by_day: BTreeMap<NaiveDate, f64>,
    pub priced: usize,
    pub unpriced: usize,
}

impl CostReport {
    pub fn total(&self) -> f64 {
        self.by_day.values().sum()
    }
}

pub fn daily_cost(priced: &[PricedInterval]) -> CostReport {
    let mut report = CostReport::default();
    for interval in priced {
        match interval.cost() {
            Some(cost) => {
                *report.by_day.entry(interval.day()).or_insert(0.0) += cost;
                report.priced += 1;
            }
            None => report.unpriced += 1,
        }
    }
    report
}

/// Match and sum in one step
pub fn daily_cost_of(rates: &[Rate], consumption: &[Consumption], basis: PriceBasis) -> CostReport {
    daily_cost(&match_rates(rates, consumption, basis))
}
