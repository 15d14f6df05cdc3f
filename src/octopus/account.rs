//! Account resolution
//!
//! Turns the account description into an immutable [`AccountInfo`] that the
//! rest of the crate passes around explicitly.

use crate::error::Result;
use crate::octopus::endpoint::{MeterRef, TariffCode};
use crate::octopus::types::{Account, Agreement, Region};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeterKind {
    Import,
    Export,
    Gas,
}

impl MeterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeterKind::Import => "import",
            MeterKind::Export => "export",
            MeterKind::Gas => "gas",
        }
    }
}

/// One meter point with its meters and current tariff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterPointRef {
    pub point: String,
    pub serials: Vec<String>,
    pub tariff: Option<TariffCode>,
}

impl MeterPointRef {
    pub fn meters(&self) -> impl Iterator<Item = MeterRef> + '_ {
        self.serials
            .iter()
            .map(|serial| MeterRef::new(self.point.clone(), serial.clone()))
    }
}

/// Whether an agreement covers `now` (both bounds inclusive)
pub fn is_current(agreement: &Agreement, now: DateTime<Utc>) -> bool {
    agreement.valid_from.is_none_or(|from| from <= now)
        && agreement.valid_to.is_none_or(|to| to >= now)
}

/// Tariff of the current agreement; the last one listed wins
pub fn current_agreement(agreements: &[Agreement], now: DateTime<Utc>) -> Option<&Agreement> {
    agreements.iter().rev().find(|a| is_current(a, now))
}

fn current_tariff(agreements: &[Agreement], now: DateTime<Utc>) -> Result<Option<TariffCode>> {
    current_agreement(agreements, now)
        .map(|a| TariffCode::new(a.tariff_code.as_str()))
        .transpose()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub number: String,
    pub import: Vec<MeterPointRef>,
    pub export: Vec<MeterPointRef>,
    pub gas: Vec<MeterPointRef>,
    pub region: Option<Region>,
}

impl AccountInfo {
    /// Collect the meter points of every property on the account
    pub fn resolve(account: &Account, now: DateTime<Utc>) -> Result<Self> {
        let mut info = AccountInfo {
            number: account.number.clone(),
            import: Vec::new(),
            export: Vec::new(),
            gas: Vec::new(),
            region: None,
        };

        for property in &account.properties {
            for point in &property.electricity_meter_points {
                let entry = MeterPointRef {
                    point: point.mpan.clone(),
                    serials: point.meters.iter().map(|m| m.serial_number.clone()).collect(),
                    tariff: current_tariff(&point.agreements, now)?,
                };
                if point.is_export {
                    info.export.push(entry);
                } else {
                    info.import.push(entry);
                }
            }
            for point in &property.gas_meter_points {
                info.gas.push(MeterPointRef {
                    point: point.mprn.clone(),
                    serials: point.meters.iter().map(|m| m.serial_number.clone()).collect(),
                    tariff: current_tariff(&point.agreements, now)?,
                });
            }
        }

        // The tariff code ends with the region letter; the meter point lookup may refine it
        info.region = info
            .import
            .iter()
            .chain(info.gas.iter())
            .find_map(|p| p.tariff.as_ref().and_then(TariffCode::region));

        Ok(info)
    }

    /// Account-less info for tariff lookups by region only
    pub fn anonymous(region: Option<Region>) -> Self {
        Self {
            number: String::new(),
            import: Vec::new(),
            export: Vec::new(),
            gas: Vec::new(),
            region,
        }
    }

    pub fn with_region(mut self, region: Option<Region>) -> Self {
        if region.is_some() {
            self.region = region;
        }
        self
    }

    pub fn points(&self, kind: MeterKind) -> &[MeterPointRef] {
        match kind {
            MeterKind::Import => &self.import,
            MeterKind::Export => &self.export,
            MeterKind::Gas => &self.gas,
        }
    }

    /// Every meter of a kind, across meter points
    pub fn meters(&self, kind: MeterKind) -> Vec<MeterRef> {
        self.points(kind).iter().flat_map(MeterPointRef::meters).collect()
    }

    /// Current tariff of the first meter point of a kind that has one
    pub fn tariff(&self, kind: MeterKind) -> Option<&TariffCode> {
        self.points(kind).iter().find_map(|p| p.tariff.as_ref())
    }

    pub fn primary_mpan(&self) -> Option<&str> {
        self.import.first().map(|p| p.point.as_str())
    }
}
