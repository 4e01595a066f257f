use std::fmt::Debug;

use crate::{document::Document, error::ExtractError};

pub mod air_quality;
pub mod weather;

pub use air_quality::AirQualityPageRules;
pub use weather::WeatherPageRules;

/// The independent current-conditions sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    AirQuality,
    Weather,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::AirQuality => "air_quality",
            SourceId::Weather => "weather",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds one page layout to raw field values.
///
/// Rules are tied to a single known snapshot of the page markup. They are pure:
/// running them twice over the same document yields identical output.
pub trait Extractor: Send + Sync + Debug {
    type Raw;

    fn source(&self) -> SourceId;

    fn extract(&self, doc: &Document) -> Result<Self::Raw, ExtractError>;
}
