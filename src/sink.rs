//! Point sinks: InfluxDB, line protocol output and an in-memory buffer

use crate::error::{OctologError, Result};
#[cfg(feature = "influx")]
use crate::logging::{StructuredLogger, get_logger};
use crate::measurements::Point;
use std::io::Write;
use std::sync::Mutex;

/// Destination for time-series points
#[async_trait::async_trait]
pub trait PointSink: Send + Sync {
    async fn write_points(&self, points: &[Point]) -> Result<()>;
}

/// Writes points as InfluxDB line protocol, one per line
pub struct LineProtocolSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineProtocolSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|_| OctologError::store("line protocol writer poisoned"))
    }
}

impl LineProtocolSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> PointSink for LineProtocolSink<W> {
    async fn write_points(&self, points: &[Point]) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| OctologError::store("line protocol writer poisoned"))?;
        for point in points {
            writeln!(out, "{}", point.to_line_protocol())?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Keeps every point written; used by tests and dry runs
#[derive(Default)]
pub struct MemorySink {
    points: Mutex<Vec<Point>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> Vec<Point> {
        self.points
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn measurement(&self, name: &str) -> Vec<Point> {
        self.points()
            .into_iter()
            .filter(|p| p.measurement == name)
            .collect()
    }
}

#[async_trait::async_trait]
impl PointSink for MemorySink {
    async fn write_points(&self, points: &[Point]) -> Result<()> {
        self.points
            .lock()
            .map_err(|_| OctologError::store("memory sink poisoned"))?
            .extend_from_slice(points);
        Ok(())
    }
}

/// InfluxDB 1.x over HTTP
#[cfg(feature = "influx")]
pub struct InfluxSink {
    client: influxdb::Client,
    database: String,
    logger: StructuredLogger,
}

#[cfg(feature = "influx")]
impl InfluxSink {
    pub fn new(config: &crate::config::InfluxConfig) -> Self {
        let database = config.database.trim().to_string();
        let mut client = influxdb::Client::new(config.url.trim(), database.as_str());
        if !config.username.trim().is_empty() {
            client = client.with_auth(config.username.trim(), config.password.as_str());
        }
        Self {
            client,
            database,
            logger: get_logger("influx"),
        }
    }

    /// Drop and recreate the database
    pub async fn reset(&self) -> Result<()> {
        use influxdb::ReadQuery;

        self.logger
            .warn(&format!("Resetting database {}", self.database));
        self.client
            .query(ReadQuery::new(format!("DROP DATABASE \"{}\"", self.database)))
            .await?;
        self.client
            .query(ReadQuery::new(format!("CREATE DATABASE \"{}\"", self.database)))
            .await?;
        Ok(())
    }

    fn write_query(point: &Point) -> influxdb::WriteQuery {
        use crate::measurements::FieldValue;
        use influxdb::{Timestamp, WriteQuery};

        let nanos = u128::try_from(point.timestamp_nanos()).unwrap_or_default();
        let mut query = WriteQuery::new(Timestamp::Nanoseconds(nanos), point.measurement.as_str());
        for (k, v) in &point.tags {
            query = query.add_tag(k.as_str(), v.as_str());
        }
        for (k, v) in &point.fields {
            query = match v {
                FieldValue::Float(f) => query.add_field(k.as_str(), *f),
                FieldValue::Integer(i) => query.add_field(k.as_str(), *i),
                FieldValue::Text(s) => query.add_field(k.as_str(), s.as_str()),
            };
        }
        query
    }
}

#[cfg(feature = "influx")]
#[async_trait::async_trait]
impl PointSink for InfluxSink {
    async fn write_points(&self, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let queries: Vec<influxdb::WriteQuery> = points.iter().map(Self::write_query).collect();
        self.client.query(queries).await?;
        self.logger.debug(&format!(
            "Wrote {} points to {}",
            points.len(),
            self.database
        ));
        Ok(())
    }
}
