//! Error types for every stage of the skystats flows.

use chrono::NaiveDate;
use reqwest::StatusCode;
use thiserror::Error;

/// The transport could not deliver a document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid request URL {url}: {message}")]
    Url { url: String, message: String },

    #[error("Response cache error: {0}")]
    Cache(#[from] std::io::Error),
}

/// An expected node or fragment is absent from a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Structure mismatch: {what}")]
    StructureMismatch { what: String },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

impl ExtractError {
    pub fn missing<S: Into<String>>(what: S) -> Self {
        Self::StructureMismatch { what: what.into() }
    }
}

/// An extracted value failed its format predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {field} format: {value:?} (expected {pattern})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        pattern: &'static str,
    },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("Invalid AQI status text: {value:?}")]
    UnknownAqiStatus { value: String },
}

/// A syntactically valid record carries an implausible value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Implausible {field} ({value}) rejected by {check}")]
pub struct PlausibilityError {
    pub check: &'static str,
    pub field: &'static str,
    pub value: String,
}

/// Caller-supplied parameters of a historical query are invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Invalid date {input:?}: expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("Start date {start} is before the earliest supported date {min}")]
    StartTooEarly { start: NaiveDate, min: NaiveDate },

    #[error("End date {end} is after the latest supported date {max}")]
    EndTooLate { end: NaiveDate, max: NaiveDate },

    #[error("End date {end} must be strictly after start date {start}")]
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },

    #[error("Invalid frequency {0:?}. Choose 'hourly' or 'daily'.")]
    InvalidFrequency(String),

    #[error("Unknown timezone {name:?}: expected an IANA name such as Asia/Bangkok")]
    UnknownTimezone { name: String },
}

/// Fatal failure of a historical archive query.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to decode archive response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Archive response shape mismatch: {0}")]
    ShapeMismatch(String),
}
