use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use crate::error::HistoryError;

use super::{Frequency, HistoricalSeries};

/// Archive JSON body requested with `timeformat=unixtime`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timezone_abbreviation: Option<String>,
    #[serde(default)]
    pub hourly: Option<SeriesBlock>,
    #[serde(default)]
    pub daily: Option<SeriesBlock>,
}

/// A `hourly` or `daily` block: epoch seconds plus one array per variable.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesBlock {
    pub time: Vec<i64>,
    #[serde(flatten)]
    pub variables: HashMap<String, Vec<Option<f64>>>,
}

impl ArchiveResponse {
    pub fn log_metadata(&self) {
        info!("Coordinates {}°N {}°E", self.latitude, self.longitude);
        if let Some(elevation) = self.elevation {
            info!("Elevation {elevation} m asl");
        }
        info!(
            "Timezone {} {}",
            self.timezone.as_deref().unwrap_or("?"),
            self.timezone_abbreviation.as_deref().unwrap_or("?")
        );
        info!("Timezone difference to GMT+0 {} s", self.utc_offset_seconds);
    }

    fn block(self, frequency: Frequency) -> Option<SeriesBlock> {
        match frequency {
            Frequency::Hourly => self.hourly,
            Frequency::Daily => self.daily,
        }
    }

    /// Reshape into one row per bucket, keyed by `bucket_starts`.
    ///
    /// The response time axis must agree with `bucket_starts` position by
    /// position. The archive returns the end date inclusively, so values past
    /// the last bucket are dropped.
    pub fn into_series(
        self,
        frequency: Frequency,
        columns: &[String],
        bucket_starts: Vec<DateTime<Utc>>,
    ) -> Result<HistoricalSeries, HistoryError> {
        let mut block = self.block(frequency).ok_or_else(|| {
            HistoryError::ShapeMismatch(format!("response has no {frequency} block"))
        })?;

        let buckets = bucket_starts.len();
        if block.time.len() < buckets {
            return Err(HistoryError::ShapeMismatch(format!(
                "{} timestamps for {buckets} {frequency} buckets",
                block.time.len()
            )));
        }
        if let Some((row, (got, want))) = block
            .time
            .iter()
            .zip(&bucket_starts)
            .enumerate()
            .find(|(_, (got, want))| **got != want.timestamp())
        {
            return Err(HistoryError::ShapeMismatch(format!(
                "time axis diverges at row {row}: got {got}, expected {}",
                want.timestamp()
            )));
        }

        let values = columns
            .iter()
            .map(|name| {
                let mut series = block.variables.remove(name).ok_or_else(|| {
                    HistoryError::ShapeMismatch(format!("missing column {name}"))
                })?;
                if series.len() < buckets {
                    return Err(HistoryError::ShapeMismatch(format!(
                        "column {name} has {} values for {buckets} buckets",
                        series.len()
                    )));
                }
                series.truncate(buckets);
                Ok(series)
            })
            .collect::<Result<Vec<_>, _>>()?;

        HistoricalSeries::new(frequency, columns.to_vec(), bucket_starts, values)
    }
}
