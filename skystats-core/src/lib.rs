//! Core library for the `skystats` CLI.
//!
//! This crate defines:
//! - Validated record types for current weather and air quality
//! - Extraction rules bound to the scraped current-conditions pages
//! - The current-conditions pipeline, isolating failures per source
//! - The historical archive client (date-range validation, query, reshaping)
//! - Configuration and the HTTP transport (retries, response cache)
//!
//! It is used by `skystats-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod history;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod plausibility;
pub mod validate;

pub use config::{Config, SourceUrls};
pub use error::{ExtractError, FetchError, HistoryError, RequestError, ValidationError};
pub use extract::{AirQualityPageRules, Extractor, SourceId, WeatherPageRules};
pub use history::{ArchiveClient, DateRange, Frequency, HistoricalSeries};
pub use http::{Fetcher, HttpTransport, ResponseCache};
pub use model::{AirQualitySnapshot, AqiStatus, CurrentConditions, WeatherSnapshot};
pub use pipeline::{CurrentPipeline, CurrentReport, FailureStage, SourceFailure};
