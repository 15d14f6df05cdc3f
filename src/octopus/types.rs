//! Wire types returned by the Octopus REST API

use crate::error::{OctologError, Result};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One page of a paged endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Unit rate or standing charge, in pence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub value_exc_vat: f64,
    pub value_inc_vat: f64,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl Rate {
    /// Whether the rate applies at `at`: `valid_from <= at < valid_to`
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_from.is_none_or(|from| from <= at) && self.valid_to.is_none_or(|to| at < to)
    }
}

/// A metered consumption interval (kWh for electricity, m³ or kWh for gas)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub consumption: f64,
    pub interval_start: DateTime<FixedOffset>,
    pub interval_end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
    pub tariff_code: String,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Register {
    pub identifier: String,
    pub rate: String,
    pub is_settlement_register: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meter {
    pub serial_number: String,
    #[serde(default)]
    pub registers: Vec<Register>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectricityMeterPoint {
    pub mpan: String,
    #[serde(default)]
    pub profile_class: Option<u32>,
    #[serde(default)]
    pub consumption_standard: Option<u64>,
    #[serde(default)]
    pub meters: Vec<Meter>,
    #[serde(default)]
    pub agreements: Vec<Agreement>,
    #[serde(default)]
    pub is_export: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasMeterPoint {
    pub mprn: String,
    #[serde(default)]
    pub consumption_standard: Option<u64>,
    #[serde(default)]
    pub meters: Vec<Meter>,
    #[serde(default)]
    pub agreements: Vec<Agreement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: u64,
    #[serde(default)]
    pub moved_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moved_out_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: String,
    #[serde(default)]
    pub address_line_3: String,
    #[serde(default)]
    pub town: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub electricity_meter_points: Vec<ElectricityMeterPoint>,
    #[serde(default)]
    pub gas_meter_points: Vec<GasMeterPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub number: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSupplyPoint {
    pub group_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterPointDetails {
    pub gsp: String,
    pub mpan: String,
    #[serde(default)]
    pub profile_class: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub rel: String,
}

/// Entry of the product catalogue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub code: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_variable: bool,
    #[serde(default)]
    pub is_green: bool,
    #[serde(default)]
    pub is_tracker: bool,
    #[serde(default)]
    pub is_prepay: bool,
    #[serde(default)]
    pub is_business: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub term: Option<u32>,
    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub brand: String,
}

/// Prices of one tariff variant for one region and payment method
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffDetails {
    pub code: String,
    pub standing_charge_exc_vat: Option<f64>,
    pub standing_charge_inc_vat: Option<f64>,
    pub online_discount_exc_vat: Option<f64>,
    pub online_discount_inc_vat: Option<f64>,
    pub dual_fuel_discount_exc_vat: Option<f64>,
    pub dual_fuel_discount_inc_vat: Option<f64>,
    pub exit_fees_exc_vat: Option<f64>,
    pub exit_fees_inc_vat: Option<f64>,
    pub standard_unit_rate_exc_vat: Option<f64>,
    pub standard_unit_rate_inc_vat: Option<f64>,
    pub day_unit_rate_exc_vat: Option<f64>,
    pub day_unit_rate_inc_vat: Option<f64>,
    pub night_unit_rate_exc_vat: Option<f64>,
    pub night_unit_rate_inc_vat: Option<f64>,
    pub links: Vec<Link>,
}

/// Region group id (`_A`) -> payment method (`direct_debit_monthly`) -> details
pub type RegionalTariffs = BTreeMap<String, BTreeMap<String, TariffDetails>>;

/// Full product description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub code: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_variable: bool,
    #[serde(default)]
    pub is_green: bool,
    #[serde(default)]
    pub is_tracker: bool,
    #[serde(default)]
    pub is_prepay: bool,
    #[serde(default)]
    pub is_business: bool,
    #[serde(default)]
    pub is_restricted: bool,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub term: Option<u32>,
    #[serde(default)]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tariffs_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub single_register_electricity_tariffs: RegionalTariffs,
    #[serde(default)]
    pub dual_register_electricity_tariffs: RegionalTariffs,
    #[serde(default)]
    pub single_register_gas_tariffs: RegionalTariffs,
    #[serde(default)]
    pub sample_quotes: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub sample_consumption: serde_json::Value,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Product {
    /// Drop the regional tables of every region except `region`
    pub fn retain_region(&mut self, region: Region) {
        let keep = region.group_id();
        self.single_register_electricity_tariffs
            .retain(|k, _| k == keep);
        self.dual_register_electricity_tariffs
            .retain(|k, _| k == keep);
        self.single_register_gas_tariffs.retain(|k, _| k == keep);
        self.sample_quotes.retain(|k, _| k == keep);
    }
}

/// Grid supply point group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    J,
    K,
    L,
    M,
    N,
    P,
}

impl Region {
    pub const ALL: [Region; 14] = [
        Region::A,
        Region::B,
        Region::C,
        Region::D,
        Region::E,
        Region::F,
        Region::G,
        Region::H,
        Region::J,
        Region::K,
        Region::L,
        Region::M,
        Region::N,
        Region::P,
    ];

    /// Group id as used by the API (`_C`)
    pub fn group_id(&self) -> &'static str {
        match self {
            Region::A => "_A",
            Region::B => "_B",
            Region::C => "_C",
            Region::D => "_D",
            Region::E => "_E",
            Region::F => "_F",
            Region::G => "_G",
            Region::H => "_H",
            Region::J => "_J",
            Region::K => "_K",
            Region::L => "_L",
            Region::M => "_M",
            Region::N => "_N",
            Region::P => "_P",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Region::A => "Eastern England",
            Region::B => "East Midlands",
            Region::C => "London",
            Region::D => "Merseyside and Northern Wales",
            Region::E => "West Midlands",
            Region::F => "North Eastern England",
            Region::G => "North Western England",
            Region::H => "Southern England",
            Region::J => "South Eastern England",
            Region::K => "Southern Wales",
            Region::L => "South Western England",
            Region::M => "Yorkshire",
            Region::N => "Southern Scotland",
            Region::P => "Northern Scotland",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.group_id(), self.name())
    }
}

impl std::str::FromStr for Region {
    type Err = OctologError;

    /// Accepts `_C`, `C` or `c`
    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().trim_start_matches('_').to_uppercase();
        Region::ALL
            .into_iter()
            .find(|r| r.group_id()[1..] == code)
            .ok_or_else(|| OctologError::api(format!("Unknown grid supply point '{}'", s)))
    }
}
