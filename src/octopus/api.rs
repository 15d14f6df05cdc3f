//! Account-level facade over the client
//!
//! [`Octopus`] pairs a client with a resolved [`AccountInfo`], so callers ask
//! for "import rates for this period" instead of assembling endpoints.

use crate::config::OctopusConfig;
use crate::error::{OctologError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::octopus::account::{AccountInfo, MeterKind};
use crate::octopus::client::{Fuel, OctopusClient, RateSeries};
use crate::octopus::endpoint::Endpoint;
use crate::octopus::query::{Grouping, Period, Query};
use crate::octopus::types::{Consumption, Product, Rate, Region};
use crate::peak::{BandUsage, Bucket, Classifier, PriceTierClassifier, unclassified, usage_by_band};
use crate::tariff::{CostReport, PriceBasis, PricedInterval, daily_cost, match_rates, prefer_direct_debit};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::collections::BTreeMap;

/// Consumption of one meter kind matched against its tariff
#[derive(Debug, Clone, Default)]
pub struct PricedUsage {
    pub rates: Vec<Rate>,
    pub intervals: Vec<PricedInterval>,
}

pub struct Octopus {
    client: OctopusClient,
    info: AccountInfo,
    basis: PriceBasis,
    logger: StructuredLogger,
}

impl Octopus {
    /// Build the client and resolve the account (or the postcode region)
    pub async fn connect(config: &OctopusConfig, now: DateTime<Utc>) -> Result<Self> {
        let client = OctopusClient::new(config)?;
        let account = config.account.trim();
        let postcode = config.postcode.trim();

        let info = if !account.is_empty() {
            let raw = client.account(account).await?;
            let info = AccountInfo::resolve(&raw, now)?;
            let region = match info.primary_mpan() {
                Some(mpan) => match client.electricity_meter_point(mpan).await {
                    Ok(details) => details.gsp.parse::<Region>().ok(),
                    Err(e) => {
                        get_logger("octopus")
                            .warn(&format!("Meter point lookup for {} failed: {}", mpan, e));
                        None
                    }
                },
                None => None,
            };
            info.with_region(region)
        } else if !postcode.is_empty() {
            let points = client.grid_supply_points(postcode).await?;
            let region = points.first().and_then(|p| p.group_id.parse::<Region>().ok());
            AccountInfo::anonymous(region)
        } else {
            AccountInfo::anonymous(None)
        };

        Ok(Self::from_parts(client, info, config.price_basis))
    }

    pub fn from_parts(client: OctopusClient, info: AccountInfo, basis: PriceBasis) -> Self {
        let mut context = LogContext::new("octopus");
        if !info.number.is_empty() {
            context = context.with_account(info.number.clone());
        }
        Self {
            client,
            info,
            basis,
            logger: get_logger_with_context(context),
        }
    }

    pub fn client(&self) -> &OctopusClient {
        &self.client
    }

    pub fn info(&self) -> &AccountInfo {
        &self.info
    }

    pub fn account_number(&self) -> &str {
        &self.info.number
    }

    pub fn region(&self) -> Option<Region> {
        self.info.region
    }

    pub fn region_name(&self) -> Option<String> {
        self.info.region.map(|r| r.to_string())
    }

    pub fn price_basis(&self) -> PriceBasis {
        self.basis
    }

    /// Consumption of every meter of a kind, concatenated
    pub async fn consumption(
        &self,
        kind: MeterKind,
        period: Period,
        grouping: Option<Grouping>,
    ) -> Result<Vec<Consumption>> {
        let meters = self.info.meters(kind);
        if meters.is_empty() {
            self.logger
                .debug(&format!("No {} meters on account", kind.as_str()));
            return Ok(Vec::new());
        }

        let mut query = Query::new().period(period);
        if let Some(g) = grouping {
            query = query.group_by(g);
        }

        let mut all = Vec::new();
        for meter in &meters {
            let records = self.client.consumption(kind, meter, query.clone()).await?;
            self.logger.debug(&format!(
                "{} meter {}/{}: {} records",
                kind.as_str(),
                meter.point,
                meter.serial,
                records.len()
            ));
            all.extend(records);
        }
        Ok(all)
    }

    pub async fn electricity_consumption(&self, period: Period, grouping: Option<Grouping>) -> Result<Vec<Consumption>> {
        self.consumption(MeterKind::Import, period, grouping).await
    }

    pub async fn electricity_export(&self, period: Period, grouping: Option<Grouping>) -> Result<Vec<Consumption>> {
        self.consumption(MeterKind::Export, period, grouping).await
    }

    pub async fn gas_consumption(&self, period: Period, grouping: Option<Grouping>) -> Result<Vec<Consumption>> {
        self.consumption(MeterKind::Gas, period, grouping).await
    }

    /// Unit rates of the current tariff of a kind
    pub async fn rates(&self, kind: MeterKind, period: Period) -> Result<Vec<Rate>> {
        let Some(tariff) = self.info.tariff(kind) else {
            self.logger
                .debug(&format!("No current {} tariff", kind.as_str()));
            return Ok(Vec::new());
        };
        let series = match kind {
            MeterKind::Gas => RateSeries::GasStandard,
            MeterKind::Import | MeterKind::Export => RateSeries::ElectricityStandard,
        };
        let rates = self
            .client
            .unit_rates(tariff, series, Query::new().period(period))
            .await?;
        Ok(prefer_direct_debit(rates))
    }

    pub async fn import_rates(&self, period: Period) -> Result<Vec<Rate>> {
        self.rates(MeterKind::Import, period).await
    }

    pub async fn export_rates(&self, period: Period) -> Result<Vec<Rate>> {
        self.rates(MeterKind::Export, period).await
    }

    pub async fn gas_rates(&self, period: Period) -> Result<Vec<Rate>> {
        self.rates(MeterKind::Gas, period).await
    }

    async fn standing_charge(&self, kind: MeterKind, at: DateTime<Utc>) -> Result<Option<f64>> {
        let Some(tariff) = self.info.tariff(kind) else {
            return Ok(None);
        };
        let fuel = match kind {
            MeterKind::Gas => Fuel::Gas,
            MeterKind::Import | MeterKind::Export => Fuel::Electricity,
        };
        let query = Query::new().period(Period::around(at, Duration::hours(1)));
        let charges = prefer_direct_debit(self.client.standing_charges(tariff, fuel, query).await?);
        Ok(charges
            .iter()
            .find(|c| c.is_effective_at(at))
            .map(|c| self.basis.price_of(c)))
    }

    /// Daily standing charge in pence in force at `at`
    pub async fn electricity_standing_charge(&self, at: DateTime<Utc>) -> Result<Option<f64>> {
        self.standing_charge(MeterKind::Import, at).await
    }

    pub async fn gas_standing_charge(&self, at: DateTime<Utc>) -> Result<Option<f64>> {
        self.standing_charge(MeterKind::Gas, at).await
    }

    async fn current_price(&self, kind: MeterKind, now: DateTime<Utc>) -> Result<Option<f64>> {
        let rates = self
            .rates(kind, Period::around(now, Duration::hours(1)))
            .await?;
        Ok(rates
            .iter()
            .find(|r| r.is_effective_at(now))
            .map(|r| self.basis.price_of(r)))
    }

    pub async fn current_import_price(&self, now: DateTime<Utc>) -> Result<Option<f64>> {
        self.current_price(MeterKind::Import, now).await
    }

    pub async fn current_export_price(&self, now: DateTime<Utc>) -> Result<Option<f64>> {
        self.current_price(MeterKind::Export, now).await
    }

    pub async fn current_gas_price(&self, now: DateTime<Utc>) -> Result<Option<f64>> {
        self.current_price(MeterKind::Gas, now).await
    }

    /// Product of the current tariff, with regional tables cut to the account's region
    pub async fn product(&self, kind: MeterKind, now: DateTime<Utc>) -> Result<Option<Product>> {
        let Some(tariff) = self.info.tariff(kind) else {
            return Ok(None);
        };
        let mut product = self.client.product(tariff.product_code(), Some(now)).await?;
        if let Some(region) = self.info.region {
            product.retain_region(region);
        }
        Ok(Some(product))
    }

    pub async fn import_product(&self, now: DateTime<Utc>) -> Result<Option<Product>> {
        self.product(MeterKind::Import, now).await
    }

    pub async fn export_product(&self, now: DateTime<Utc>) -> Result<Option<Product>> {
        self.product(MeterKind::Export, now).await
    }

    pub async fn gas_product(&self, now: DateTime<Utc>) -> Result<Option<Product>> {
        self.product(MeterKind::Gas, now).await
    }

    /// Half-hourly consumption of a kind priced against its tariff
    pub async fn priced(&self, kind: MeterKind, period: Period) -> Result<PricedUsage> {
        let consumption = self.consumption(kind, period, None).await?;
        if consumption.is_empty() {
            return Ok(PricedUsage::default());
        }
        let rates = self.rates(kind, period).await?;
        let intervals = match_rates(&rates, &consumption, self.basis);
        Ok(PricedUsage { rates, intervals })
    }

    /// Per-day price tiers of the import tariff
    pub async fn price_tiers(&self, period: Period) -> Result<PriceTierClassifier> {
        let rates = self.import_rates(period).await?;
        Ok(PriceTierClassifier::from_rates(&rates, self.basis))
    }

    /// Import consumption split by band
    pub async fn consumption_by_band<C: Classifier + ?Sized>(
        &self,
        period: Period,
        classifier: &C,
        bucket: Bucket,
    ) -> Result<BTreeMap<DateTime<FixedOffset>, BandUsage>> {
        let usage = self.priced(MeterKind::Import, period).await?;
        let skipped = unclassified(&usage.intervals, classifier);
        if skipped > 0 {
            self.logger.warn(&format!(
                "{} of {} import intervals could not be classified",
                skipped,
                usage.intervals.len()
            ));
        }
        Ok(usage_by_band(&usage.intervals, classifier, bucket))
    }

    /// Daily import cost in pence, standing charge excluded
    pub async fn electricity_cost(&self, period: Period) -> Result<CostReport> {
        let usage = self.priced(MeterKind::Import, period).await?;
        Ok(self.report("import", &usage))
    }

    /// Daily export earnings in pence
    pub async fn electricity_gain(&self, period: Period) -> Result<CostReport> {
        let usage = self.priced(MeterKind::Export, period).await?;
        Ok(self.report("export", &usage))
    }

    fn report(&self, what: &str, usage: &PricedUsage) -> CostReport {
        let report = daily_cost(&usage.intervals);
        if report.unpriced > 0 {
            self.logger.warn(&format!(
                "{} of {} {} intervals had no matching rate",
                report.unpriced,
                usage.intervals.len(),
                what
            ));
        }
        report
    }

    /// Account description as returned by the API
    pub async fn raw_account(&self) -> Result<serde_json::Value> {
        if self.info.number.is_empty() {
            return Err(OctologError::config("raw requires an account number"));
        }
        let endpoint = Endpoint::Account {
            account: self.info.number.clone(),
        };
        self.client.fetch_json(&endpoint, &Query::new()).await
    }
}
