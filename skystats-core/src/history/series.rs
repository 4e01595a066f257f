use chrono::{DateTime, SecondsFormat, Utc};
use std::io;

use crate::error::HistoryError;

use super::Frequency;

/// One row per time bucket; columns in configured order.
///
/// Values are stored column-major, each column aligned by position with
/// [`HistoricalSeries::timestamps`]. Missing readings are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    frequency: Frequency,
    columns: Vec<String>,
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<Vec<Option<f64>>>,
}

impl HistoricalSeries {
    pub fn new(
        frequency: Frequency,
        columns: Vec<String>,
        timestamps: Vec<DateTime<Utc>>,
        values: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, HistoryError> {
        if columns.len() != values.len() {
            return Err(HistoryError::ShapeMismatch(format!(
                "{} columns but {} value series",
                columns.len(),
                values.len()
            )));
        }
        if let Some((name, series)) = columns
            .iter()
            .zip(&values)
            .find(|(_, series)| series.len() != timestamps.len())
        {
            return Err(HistoryError::ShapeMismatch(format!(
                "column {name} has {} values for {} timestamps",
                series.len(),
                timestamps.len()
            )));
        }

        Ok(Self {
            frequency,
            columns,
            timestamps,
            values,
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Values of a single column, if present.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = (DateTime<Utc>, Vec<Option<f64>>)> + '_ {
        self.timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| (*ts, self.values.iter().map(|col| col[i]).collect()))
    }

    pub fn head(&self, n: usize) -> impl Iterator<Item = (DateTime<Utc>, Vec<Option<f64>>)> + '_ {
        self.rows().take(n)
    }

    /// Header `date` + columns; dates in RFC 3339 UTC, missing values as empty cells.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header = vec!["date"];
        header.extend(self.columns.iter().map(String::as_str));
        out.write_record(&header)?;

        for (ts, values) in self.rows() {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(ts.to_rfc3339_opts(SecondsFormat::Secs, true));
            for value in values {
                record.push(value.map(|v| v.to_string()).unwrap_or_default());
            }
            out.write_record(&record)?;
        }

        out.flush()?;
        Ok(())
    }
}
