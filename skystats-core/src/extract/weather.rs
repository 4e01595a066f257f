use tracing::debug;

use crate::{
    document::{Document, Query},
    error::ExtractError,
    model::RawWeather,
};

use super::{Extractor, SourceId};

const INFO_CELLS: &str = "div.bk-focus__info td";
const QUICK_LOOK: &str = "div.bk-focus__qlook";
const HEADLINE: &str = "div.h2";
const COMPASS: &str = r#"span[class^="comp"]"#;
const PARAGRAPH: &str = "p";

/// Position of the pressure cell once the trailing cell is dropped.
/// Nothing checks the row label, so a reordered table yields wrong values
/// rather than an error.
const PRESSURE_CELL: usize = 4;
/// Text fragment of the last quick-look paragraph that carries `Wind: N km/h`.
const WIND_FRAGMENT: usize = 2;

/// Extraction rules for the current-weather page.
#[derive(Debug, Clone)]
pub struct WeatherPageRules {
    info_cells: Query,
    quick_look: Query,
    headline: Query,
    compass: Query,
    paragraph: Query,
}

impl WeatherPageRules {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            info_cells: Query::parse(INFO_CELLS)?,
            quick_look: Query::parse(QUICK_LOOK)?,
            headline: Query::parse(HEADLINE)?,
            compass: Query::parse(COMPASS)?,
            paragraph: Query::parse(PARAGRAPH)?,
        })
    }

    fn info_values(&self, doc: &Document) -> Result<(String, String), ExtractError> {
        let mut cells: Vec<String> = doc
            .all(&self.info_cells)
            .iter()
            .map(|cell| cell.text().trim().to_string())
            .collect();
        cells.pop();

        let pressure = cells
            .get(PRESSURE_CELL)
            .cloned()
            .ok_or_else(|| ExtractError::missing(format!("{INFO_CELLS} #{PRESSURE_CELL}")))?;
        let humidity = cells
            .last()
            .cloned()
            .ok_or_else(|| ExtractError::missing(format!("{INFO_CELLS} (last)")))?;

        Ok((pressure, humidity))
    }
}

impl Extractor for WeatherPageRules {
    type Raw = RawWeather;

    fn source(&self) -> SourceId {
        SourceId::Weather
    }

    fn extract(&self, doc: &Document) -> Result<RawWeather, ExtractError> {
        let (pressure, humidity) = self.info_values(doc)?;

        let quick_look = doc.one(&self.quick_look)?;
        let temperature = quick_look.one(&self.headline)?.text().replace('\u{a0}', "");
        let wind_direction = quick_look.one(&self.compass)?.attr("title")?.to_string();
        let summary = quick_look.one(&self.paragraph)?.text();

        let last_paragraph = quick_look
            .all(&self.paragraph)
            .last()
            .copied()
            .ok_or_else(|| ExtractError::missing(format!("{QUICK_LOOK} {PARAGRAPH} (last)")))?;
        let wind_power = last_paragraph
            .strings()
            .get(WIND_FRAGMENT)
            .and_then(|fragment| fragment.split(':').nth(1))
            .map(|power| power.trim().to_string())
            .ok_or_else(|| {
                ExtractError::missing(format!(
                    "'label: value' text fragment #{WIND_FRAGMENT} in last {QUICK_LOOK} {PARAGRAPH}"
                ))
            })?;

        debug!(%pressure, %humidity, %temperature, "extracted weather fields");

        Ok(RawWeather {
            pressure,
            humidity,
            temperature,
            summary,
            wind_power,
            wind_direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherSnapshot;

    const PAGE: &str = include_str!("../../tests/fixtures/weather_page.html");

    fn rules() -> WeatherPageRules {
        WeatherPageRules::new().expect("selectors compile")
    }

    #[test]
    fn extracts_fixture_fields() {
        let doc = Document::parse(PAGE);
        let raw = rules().extract(&doc).expect("fixture matches the rules");

        assert_eq!(
            raw,
            RawWeather {
                pressure: "1005 mbar".into(),
                humidity: "67%".into(),
                temperature: "34°C".into(),
                summary: "Partly sunny.".into(),
                wind_power: "11 km/h".into(),
                wind_direction: "Wind blowing from 0° North to South".into(),
            }
        );
        assert!(WeatherSnapshot::try_from(raw).is_ok());
    }

    #[test]
    fn extraction_is_deterministic() {
        let doc = Document::parse(PAGE);
        let rules = rules();
        assert_eq!(rules.extract(&doc).unwrap(), rules.extract(&doc).unwrap());
    }

    #[test]
    fn missing_quick_look_is_structure_mismatch() {
        let page = PAGE.replace("bk-focus__qlook", "bk-focus__gone");
        let err = rules().extract(&Document::parse(&page)).unwrap_err();
        assert_eq!(err, ExtractError::missing(QUICK_LOOK));
    }

    #[test]
    fn short_info_table_is_structure_mismatch() {
        let page = r#"<div class="bk-focus__info"><table><tr><td>1 km</td></tr></table></div>"#;
        let err = rules().extract(&Document::parse(page)).unwrap_err();
        assert!(err.to_string().contains("bk-focus__info"));
    }

    #[test]
    fn missing_compass_title_is_structure_mismatch() {
        let page = PAGE.replace("title=\"Wind blowing", "data-title=\"Wind blowing");
        let err = rules().extract(&Document::parse(&page)).unwrap_err();
        assert!(err.to_string().contains("attribute 'title'"));
    }

    #[test]
    fn reordered_rows_corrupt_values_without_error() {
        let page = PAGE
            .replace("<td>1005 mbar</td>", "<td>10 km</td>")
            .replacen("<td>10 km</td>", "<td>1005 mbar</td>", 1);
        let doc = Document::parse(&page);
        let raw = rules().extract(&doc).expect("still extracts");
        assert_eq!(raw.pressure, "10 km");
        assert!(WeatherSnapshot::try_from(raw).is_err());
    }
}
