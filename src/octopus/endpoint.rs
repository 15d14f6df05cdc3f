//! REST endpoints of the Octopus API
//!
//! Every endpoint variant carries the path arguments it needs, so a request
//! is fully described by an [`Endpoint`] plus a [`Query`](super::query::Query).

use crate::error::{OctologError, Result};
use crate::octopus::types::Region;

/// Query parameters understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    PageSize,
    PeriodFrom,
    PeriodTo,
    OrderBy,
    GroupBy,
    TariffsActiveAt,
    Postcode,
    IsVariable,
    IsGreen,
    IsTracker,
    IsPrepay,
    IsBusiness,
    AvailableAt,
}

impl Param {
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::PageSize => "page_size",
            Param::PeriodFrom => "period_from",
            Param::PeriodTo => "period_to",
            Param::OrderBy => "order_by",
            Param::GroupBy => "group_by",
            Param::TariffsActiveAt => "tariffs_active_at",
            Param::Postcode => "postcode",
            Param::IsVariable => "is_variable",
            Param::IsGreen => "is_green",
            Param::IsTracker => "is_tracker",
            Param::IsPrepay => "is_prepay",
            Param::IsBusiness => "is_business",
            Param::AvailableAt => "available_at",
        }
    }
}

const PRODUCTS_PARAMS: &[Param] = &[
    Param::IsVariable,
    Param::IsGreen,
    Param::IsTracker,
    Param::IsPrepay,
    Param::IsBusiness,
    Param::AvailableAt,
    Param::PageSize,
];
const PRODUCT_PARAMS: &[Param] = &[Param::TariffsActiveAt];
const SUPPLY_POINT_PARAMS: &[Param] = &[Param::Postcode];
const RATE_PARAMS: &[Param] = &[Param::PeriodFrom, Param::PeriodTo, Param::PageSize];
const CONSUMPTION_PARAMS: &[Param] = &[
    Param::PageSize,
    Param::PeriodFrom,
    Param::PeriodTo,
    Param::OrderBy,
    Param::GroupBy,
];

/// Tariff code such as `E-1R-AGILE-24-10-01-C`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TariffCode(String);

impl TariffCode {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        let trimmed = code.trim();
        // fuel + register prefix (5 chars), product, region suffix (2 chars)
        if !trimmed.is_ascii() || trimmed.len() < 8 {
            return Err(OctologError::validation(
                "tariff_code",
                format!("'{}' is not a tariff code", code),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Product code: the tariff code without its 5-character fuel/register
    /// prefix and 2-character region suffix
    pub fn product_code(&self) -> &str {
        &self.0[5..self.0.len() - 2]
    }

    /// Region encoded in the last character
    pub fn region(&self) -> Option<Region> {
        self.0[self.0.len() - 1..].parse().ok()
    }
}

impl std::fmt::Display for TariffCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A physical meter: meter point identifier (MPAN/MPRN) and serial number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeterRef {
    pub point: String,
    pub serial: String,
}

impl MeterRef {
    pub fn new(point: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            point: point.into(),
            serial: serial.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Products,
    Product { product_code: String },
    Account { account: String },
    SupplyPoints,
    ElectricityMeterPoint { mpan: String },
    ElectricityStandingCharges(TariffCode),
    ElectricityStandardUnitRates(TariffCode),
    ElectricityDayUnitRates(TariffCode),
    ElectricityNightUnitRates(TariffCode),
    GasStandingCharges(TariffCode),
    GasStandardUnitRates(TariffCode),
    ElectricityConsumption(MeterRef),
    ElectricityExport(MeterRef),
    GasConsumption(MeterRef),
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Products => "Products",
            Endpoint::Product { .. } => "Product",
            Endpoint::Account { .. } => "Account",
            Endpoint::SupplyPoints => "SupplyPoints",
            Endpoint::ElectricityMeterPoint { .. } => "ElectricityMeterPoints",
            Endpoint::ElectricityStandingCharges(_) => "ElectricityStandingCharges",
            Endpoint::ElectricityStandardUnitRates(_) => "ElectricityStandardUnitRates",
            Endpoint::ElectricityDayUnitRates(_) => "ElectricityDayUnitRates",
            Endpoint::ElectricityNightUnitRates(_) => "ElectricityNightUnitRates",
            Endpoint::GasStandingCharges(_) => "GasStandingCharges",
            Endpoint::GasStandardUnitRates(_) => "GasStandardUnitRates",
            Endpoint::ElectricityConsumption(_) => "ElectricityConsumption",
            Endpoint::ElectricityExport(_) => "ElectricityExport",
            Endpoint::GasConsumption(_) => "GasConsumption",
        }
    }

    /// Endpoints tied to an account need the API key
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Endpoint::Account { .. }
                | Endpoint::ElectricityMeterPoint { .. }
                | Endpoint::ElectricityConsumption(_)
                | Endpoint::ElectricityExport(_)
                | Endpoint::GasConsumption(_)
        )
    }

    /// Whether the response is a `{count, next, previous, results}` page
    pub fn is_paged(&self) -> bool {
        !matches!(
            self,
            Endpoint::Product { .. } | Endpoint::Account { .. } | Endpoint::ElectricityMeterPoint { .. }
        )
    }

    pub fn params(&self) -> &'static [Param] {
        match self {
            Endpoint::Products => PRODUCTS_PARAMS,
            Endpoint::Product { .. } => PRODUCT_PARAMS,
            Endpoint::SupplyPoints => SUPPLY_POINT_PARAMS,
            Endpoint::Account { .. } | Endpoint::ElectricityMeterPoint { .. } => &[],
            Endpoint::ElectricityStandingCharges(_)
            | Endpoint::ElectricityStandardUnitRates(_)
            | Endpoint::ElectricityDayUnitRates(_)
            | Endpoint::ElectricityNightUnitRates(_)
            | Endpoint::GasStandingCharges(_)
            | Endpoint::GasStandardUnitRates(_) => RATE_PARAMS,
            Endpoint::ElectricityConsumption(_)
            | Endpoint::ElectricityExport(_)
            | Endpoint::GasConsumption(_) => CONSUMPTION_PARAMS,
        }
    }

    /// Path relative to the API root, with a trailing slash
    pub fn path(&self) -> String {
        match self {
            Endpoint::Products => "v1/products/".to_string(),
            Endpoint::Product { product_code } => format!("v1/products/{}/", product_code),
            Endpoint::Account { account } => format!("v1/accounts/{}/", account),
            Endpoint::SupplyPoints => "v1/industry/grid-supply-points/".to_string(),
            Endpoint::ElectricityMeterPoint { mpan } => {
                format!("v1/electricity-meter-points/{}/", mpan)
            }
            Endpoint::ElectricityStandingCharges(t) => tariff_path("electricity", t, "standing-charges"),
            Endpoint::ElectricityStandardUnitRates(t) => {
                tariff_path("electricity", t, "standard-unit-rates")
            }
            Endpoint::ElectricityDayUnitRates(t) => tariff_path("electricity", t, "day-unit-rates"),
            Endpoint::ElectricityNightUnitRates(t) => {
                tariff_path("electricity", t, "night-unit-rates")
            }
            Endpoint::GasStandingCharges(t) => tariff_path("gas", t, "standing-charges"),
            Endpoint::GasStandardUnitRates(t) => tariff_path("gas", t, "standard-unit-rates"),
            Endpoint::ElectricityConsumption(m) | Endpoint::ElectricityExport(m) => format!(
                "v1/electricity-meter-points/{}/meters/{}/consumption/",
                m.point, m.serial
            ),
            Endpoint::GasConsumption(m) => format!(
                "v1/gas-meter-points/{}/meters/{}/consumption/",
                m.point, m.serial
            ),
        }
    }
}

fn tariff_path(fuel: &str, tariff: &TariffCode, series: &str) -> String {
    format!(
        "v1/products/{}/{}-tariffs/{}/{}/",
        tariff.product_code(),
        fuel,
        tariff.as_str(),
        series
    )
}
