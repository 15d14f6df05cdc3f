//! One-shot jobs run from the command line
//!
//! Every job takes the account facade, a sink and `today`, writes its points
//! and reports how many went to each measurement.

use crate::config::Config;
use crate::error::Result;
use crate::logging::{LogContext, get_logger_with_context};
use crate::measurements::{self, Point};
use crate::octopus::{Grouping, MeterKind, Octopus, Period};
use crate::peak::{Bucket, PeakMode, unclassified, usage_by_band};
use crate::sink::PointSink;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;

pub const DEFAULT_DAYS: u32 = 30;
pub const MONTHLY_DAYS: u32 = 365;
/// Upper bound accepted for `--days`
pub const MAX_DAYS: i64 = 3660;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Usage { days: u32 },
    Monthly,
    Peak { reset: bool },
    Cost { days: u32 },
    Raw,
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Usage { .. } => "usage",
            Job::Monthly => "monthly",
            Job::Peak { .. } => "peak",
            Job::Cost { .. } => "cost",
            Job::Raw => "raw",
        }
    }
}

/// Points written per measurement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub written: BTreeMap<String, usize>,
}

impl JobReport {
    pub fn total(&self) -> usize {
        self.written.values().sum()
    }

    pub fn count(&self, measurement: &str) -> usize {
        self.written.get(measurement).copied().unwrap_or(0)
    }

    async fn write(&mut self, sink: &dyn PointSink, measurement: &str, points: Vec<Point>) -> Result<()> {
        sink.write_points(&points).await?;
        *self.written.entry(measurement.to_string()).or_insert(0) += points.len();
        Ok(())
    }

    pub fn summary(&self) -> String {
        if self.written.is_empty() {
            return "nothing written".to_string();
        }
        self.written
            .iter()
            .map(|(m, n)| format!("{}={}", m, n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn logger_for(octopus: &Octopus, job: &str) -> crate::logging::StructuredLogger {
    get_logger_with_context(
        LogContext::new("jobs")
            .with_account(octopus.account_number().to_string())
            .with_job(job),
    )
}

/// Daily import, export and gas for the last `days` days
pub async fn run_usage(octopus: &Octopus, sink: &dyn PointSink, today: NaiveDate, days: u32) -> Result<JobReport> {
    let period = Period::days_ago(today, days, days)?;
    write_consumption(
        octopus,
        sink,
        period,
        Grouping::Day,
        [
            measurements::ELECTRICITY_CONSUMPTION,
            measurements::ELECTRICITY_EXPORT,
            measurements::GAS_CONSUMPTION,
        ],
        measurements::consumption_points,
    )
    .await
}

/// Whole months of import, export and gas for the last year
pub async fn run_monthly(octopus: &Octopus, sink: &dyn PointSink, today: NaiveDate) -> Result<JobReport> {
    let period = Period::days_ago(today, MONTHLY_DAYS, MONTHLY_DAYS)?;
    write_consumption(
        octopus,
        sink,
        period,
        Grouping::Month,
        [
            measurements::ELECTRICITY_MONTHLY_CONSUMPTION,
            measurements::ELECTRICITY_MONTHLY_EXPORT,
            measurements::GAS_MONTHLY_CONSUMPTION,
        ],
        measurements::monthly_points,
    )
    .await
}

async fn write_consumption(
    octopus: &Octopus,
    sink: &dyn PointSink,
    period: Period,
    grouping: Grouping,
    names: [&str; 3],
    build: fn(&[crate::octopus::Consumption], &str, &str) -> Vec<Point>,
) -> Result<JobReport> {
    let account = octopus.account_number();
    let mut report = JobReport::default();
    let kinds = [MeterKind::Import, MeterKind::Export, MeterKind::Gas];

    for (kind, name) in kinds.into_iter().zip(names) {
        let records = octopus.consumption(kind, period, Some(grouping)).await?;
        report.write(sink, name, build(&records, name, account)).await?;
    }
    Ok(report)
}

/// Daily and monthly import split into peak, off-peak and standard
pub async fn run_peak(
    octopus: &Octopus,
    sink: &dyn PointSink,
    config: &Config,
    today: NaiveDate,
    reset: bool,
) -> Result<JobReport> {
    let logger = logger_for(octopus, "peak");
    let period = if reset {
        Period::days_ago(today, MONTHLY_DAYS, MONTHLY_DAYS)?
    } else {
        Period::since_last_month(today)?
    };

    let usage = octopus.priced(MeterKind::Import, period).await?;
    let mode = PeakMode::from_config(&config.peak, config.tz()?, &usage.rates, octopus.price_basis())?;
    if let PeakMode::Price(tiers) = &mode {
        logger.debug(&format!("Price tiers for {} days", tiers.days()));
    }
    let skipped = unclassified(&usage.intervals, &mode);
    if skipped > 0 {
        logger.warn(&format!(
            "{} of {} import intervals had no matching rate and were left out",
            skipped,
            usage.intervals.len()
        ));
    }

    let account = octopus.account_number();
    let mut report = JobReport::default();

    let monthly = usage_by_band(&usage.intervals, &mode, Bucket::Month);
    let name = measurements::PEAK_OFFPEAK_MONTHLY;
    report
        .write(sink, name, measurements::band_points(&monthly, name, account))
        .await?;

    let daily = usage_by_band(&usage.intervals, &mode, Bucket::Day);
    let name = measurements::PEAK_OFFPEAK_DAILY;
    report
        .write(sink, name, measurements::band_points(&daily, name, account))
        .await?;

    Ok(report)
}

/// Daily import cost with standing charge, and daily export earnings
pub async fn run_cost(octopus: &Octopus, sink: &dyn PointSink, today: NaiveDate, days: u32) -> Result<JobReport> {
    let logger = logger_for(octopus, "cost");
    let period = Period::days_ago(today, days, days)?;
    let now = Utc.from_utc_datetime(&today.and_time(NaiveTime::MIN));
    let account = octopus.account_number();
    let mut report = JobReport::default();

    let cost = octopus.electricity_cost(period).await?;
    let standing = match octopus.electricity_standing_charge(now).await? {
        Some(charge) => charge,
        None => {
            logger.warn("No standing charge in force, writing unit costs only");
            0.0
        }
    };
    report
        .write(
            sink,
            measurements::DAILY_ELECTRICITY_COST,
            measurements::cost_points(&cost.by_day, standing, account),
        )
        .await?;

    let gain = octopus.electricity_gain(period).await?;
    report
        .write(
            sink,
            measurements::DAILY_EXPORT_GAIN,
            measurements::gain_points(&gain.by_day, account),
        )
        .await?;

    Ok(report)
}

/// Pretty-printed account description
pub async fn raw_account(octopus: &Octopus) -> Result<String> {
    let value = octopus.raw_account().await?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Run `job`; `raw` prints to stdout and writes no points
pub async fn run(job: Job, octopus: &Octopus, sink: &dyn PointSink, config: &Config, today: NaiveDate) -> Result<JobReport> {
    let logger = logger_for(octopus, job.name());
    logger.info(&format!("Starting {} job for {}", job.name(), today));

    let report = match job {
        Job::Usage { days } => run_usage(octopus, sink, today, days).await?,
        Job::Monthly => run_monthly(octopus, sink, today).await?,
        Job::Peak { reset } => run_peak(octopus, sink, config, today, reset).await?,
        Job::Cost { days } => run_cost(octopus, sink, today, days).await?,
        Job::Raw => {
            println!("{}", raw_account(octopus).await?);
            JobReport::default()
        }
    };

    logger.info(&format!("{} job done: {}", job.name(), report.summary()));
    Ok(report)
}
