//! HTTP client for the Octopus REST API

use crate::config::OctopusConfig;
use crate::error::{OctologError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::octopus::account::MeterKind;
use crate::octopus::endpoint::{Endpoint, MeterRef, TariffCode};
use crate::octopus::pagination::Pages;
use crate::octopus::query::{ProductFilter, Query};
use crate::octopus::types::{
    Account, Consumption, GridSupplyPoint, MeterPointDetails, Product, ProductSummary, Rate,
};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Unit rate series published for a tariff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSeries {
    ElectricityStandard,
    ElectricityDay,
    ElectricityNight,
    GasStandard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fuel {
    Electricity,
    Gas,
}

/// Octopus API client
///
/// Holds no per-request state: every call takes its [`Endpoint`] and
/// [`Query`] explicitly.
pub struct OctopusClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
    max_pages: u32,
    logger: StructuredLogger,
}

impl OctopusClient {
    /// Create a client from configuration
    pub fn new(config: &OctopusConfig) -> Result<Self> {
        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());
        if api_key.is_none() && !config.account.trim().is_empty() {
            return Err(OctologError::config(format!(
                "Account {} configured without an API key",
                config.account.trim()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            api_key,
            page_size: config.page_size,
            max_pages: config.max_pages,
            logger: get_logger("octopus"),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Page size requested from paged endpoints
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Absolute URL of `endpoint` with the query parameters it accepts
    pub fn url_for(&self, endpoint: &Endpoint, query: &Query) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.path());
        let pairs = query.pairs_for(endpoint);
        let url = if pairs.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, pairs.iter().map(|(k, v)| (*k, v.as_str())))
        };
        url.map_err(|e| OctologError::config(format!("Invalid API URL '{}': {}", raw, e)))
    }

    /// Key to send for `endpoint`, failing before any request when one is needed and missing
    fn credentials(&self, endpoint: &Endpoint) -> Result<Option<&str>> {
        if !endpoint.requires_auth() {
            return Ok(None);
        }
        self.api_key
            .as_deref()
            .map(Some)
            .ok_or_else(|| OctologError::api_key_missing(endpoint.name()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        api_key: Option<&str>,
    ) -> Result<T> {
        self.logger.debug(&format!("GET {}", url));

        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("octolog/", env!("CARGO_PKG_VERSION")));
        if let Some(key) = api_key {
            request = request.basic_auth(key, None::<&str>);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            self.logger
                .warn(&format!("Octopus API returned {}", status.as_u16()));
            return Err(error_for_status(status, body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Raw JSON of a single request (first page only for paged endpoints)
    pub async fn fetch_json(&self, endpoint: &Endpoint, query: &Query) -> Result<serde_json::Value> {
        let key = self.credentials(endpoint)?;
        let url = self.url_for(endpoint, query)?;
        self.get_json(url, key).await
    }

    /// Fetch a non-paged object
    pub async fn fetch_one<T: DeserializeOwned>(&self, endpoint: &Endpoint, query: &Query) -> Result<T> {
        let key = self.credentials(endpoint)?;
        let url = self.url_for(endpoint, query)?;
        self.get_json(url, key).await
    }

    /// Lazy page sequence over a paged endpoint
    pub fn pages<T: DeserializeOwned>(&self, endpoint: &Endpoint, query: &Query) -> Result<Pages<'_, T>> {
        let key = self.credentials(endpoint)?;
        let url = self.url_for(endpoint, query)?;
        Ok(Pages::new(self, endpoint.name(), key, url, self.max_pages))
    }

    /// All results of a paged endpoint
    pub async fn fetch_all<T: DeserializeOwned>(&self, endpoint: &Endpoint, query: &Query) -> Result<Vec<T>> {
        let results: Vec<T> = self.pages(endpoint, query)?.collect_all().await?;
        self.logger.debug(&format!(
            "{} returned {} records",
            endpoint.name(),
            results.len()
        ));
        Ok(results)
    }

    fn paged_query(&self, query: Query) -> Query {
        if query.page_size.is_some() {
            query
        } else {
            query.page_size(self.page_size)
        }
    }

    pub async fn products(&self, filter: ProductFilter) -> Result<Vec<ProductSummary>> {
        let query = self.paged_query(Query::new().filter(filter));
        self.fetch_all(&Endpoint::Products, &query).await
    }

    pub async fn product(&self, code: &str, active_at: Option<DateTime<Utc>>) -> Result<Product> {
        let endpoint = Endpoint::Product {
            product_code: code.to_string(),
        };
        let query = match active_at {
            Some(at) => Query::new().active_at(at),
            None => Query::new(),
        };
        self.fetch_one(&endpoint, &query).await
    }

    pub async fn account(&self, number: &str) -> Result<Account> {
        let endpoint = Endpoint::Account {
            account: number.to_string(),
        };
        self.fetch_one(&endpoint, &Query::new()).await
    }

    pub async fn grid_supply_points(&self, postcode: &str) -> Result<Vec<GridSupplyPoint>> {
        let query = Query::new().postcode(postcode.trim());
        self.fetch_all(&Endpoint::SupplyPoints, &query).await
    }

    pub async fn electricity_meter_point(&self, mpan: &str) -> Result<MeterPointDetails> {
        let endpoint = Endpoint::ElectricityMeterPoint {
            mpan: mpan.to_string(),
        };
        self.fetch_one(&endpoint, &Query::new()).await
    }

    pub async fn unit_rates(&self, tariff: &TariffCode, series: RateSeries, query: Query) -> Result<Vec<Rate>> {
        let tariff = tariff.clone();
        let endpoint = match series {
            RateSeries::ElectricityStandard => Endpoint::ElectricityStandardUnitRates(tariff),
            RateSeries::ElectricityDay => Endpoint::ElectricityDayUnitRates(tariff),
            RateSeries::ElectricityNight => Endpoint::ElectricityNightUnitRates(tariff),
            RateSeries::GasStandard => Endpoint::GasStandardUnitRates(tariff),
        };
        self.fetch_all(&endpoint, &self.paged_query(query)).await
    }

    pub async fn standing_charges(&self, tariff: &TariffCode, fuel: Fuel, query: Query) -> Result<Vec<Rate>> {
        let endpoint = match fuel {
            Fuel::Electricity => Endpoint::ElectricityStandingCharges(tariff.clone()),
            Fuel::Gas => Endpoint::GasStandingCharges(tariff.clone()),
        };
        self.fetch_all(&endpoint, &self.paged_query(query)).await
    }

    pub async fn consumption(&self, kind: MeterKind, meter: &MeterRef, query: Query) -> Result<Vec<Consumption>> {
        let meter = meter.clone();
        let endpoint = match kind {
            MeterKind::Import => Endpoint::ElectricityConsumption(meter),
            MeterKind::Export => Endpoint::ElectricityExport(meter),
            MeterKind::Gas => Endpoint::GasConsumption(meter),
        };
        self.fetch_all(&endpoint, &self.paged_query(query)).await
    }
}

/// Map a non-success status to an error
pub fn error_for_status(status: StatusCode, body: String) -> OctologError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OctologError::auth(format!(
            "{} - check the API key and account number",
            status
        )),
        StatusCode::TOO_MANY_REQUESTS => OctologError::RateLimited,
        _ => OctologError::http(status.as_u16(), body),
    }
}
