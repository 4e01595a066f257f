use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::Text;
use skystats_core::{
    ArchiveClient, Config, CurrentPipeline, DateRange, Frequency, HttpTransport, ResponseCache,
};
use std::{fs, path::PathBuf, str::FromStr};
use tracing::{info, warn};

const HEAD_ROWS: usize = 5;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skystats", version, about = "Current conditions and historical weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the air-quality and weather page URLs.
    Configure {
        #[arg(long)]
        air_url: Option<String>,

        #[arg(long)]
        weather_url: Option<String>,
    },

    /// Scrape current weather and air quality and print them as one JSON object.
    Current {
        /// Overrides the configured air-quality page.
        #[arg(long)]
        air_url: Option<String>,

        /// Overrides the configured weather page.
        #[arg(long)]
        weather_url: Option<String>,

        /// Also write the JSON object to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch historical weather data.
    History {
        /// Start date in the format YYYY-MM-DD
        #[arg(short, long)]
        start_date: String,

        /// End date in the format YYYY-MM-DD (excluded)
        #[arg(short, long)]
        end_date: String,

        /// Frequency of data to fetch: hourly or daily
        #[arg(short, long, value_parser = Frequency::from_str)]
        frequency: Frequency,

        /// Name of the output CSV file
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure {
                air_url,
                weather_url,
            } => configure(air_url, weather_url),
            Command::Current {
                air_url,
                weather_url,
                output,
            } => {
                let config = Config::load()?
                    .with_env_overrides()
                    .with_overrides(air_url, weather_url);
                current(&config, output).await
            }
            Command::History {
                start_date,
                end_date,
                frequency,
                output,
            } => {
                let config = Config::load()?;
                // Validated before anything touches the network.
                let range = DateRange::parse(&start_date, &end_date)?;
                history(&config, range, frequency, output).await
            }
        }
    }
}

fn configure(air_url: Option<String>, weather_url: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;

    let air_url = match air_url {
        Some(url) => url,
        None => prompt_url("Air-quality page URL:", config.sources.air_url.as_deref())?,
    };
    let weather_url = match weather_url {
        Some(url) => url,
        None => prompt_url("Weather page URL:", config.sources.weather_url.as_deref())?,
    };

    let config = config.with_overrides(Some(air_url), Some(weather_url));
    config.save()?;

    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn prompt_url(label: &str, current: Option<&str>) -> anyhow::Result<String> {
    let mut prompt = Text::new(label).with_help_message("Full URL of the page to scrape");
    if let Some(current) = current {
        prompt = prompt.with_default(current);
    }
    let url = prompt.prompt().context("Failed to read URL")?;
    Ok(url.trim().to_string())
}

async fn current(config: &Config, output: Option<PathBuf>) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config.http)?;
    let pipeline = CurrentPipeline::from_config(config, transport)?;

    info!("Query time = {}", Local::now().format("%Y-%m-%d %H:%M"));
    let report = pipeline.run().await;
    for failure in &report.failures {
        warn!("Skipped {failure}");
    }

    let json = report
        .conditions
        .to_json()
        .context("Failed to serialize result")?;
    let Some(json) = json else {
        warn!("No source succeeded; nothing to output");
        return Ok(());
    };

    println!("{json}");
    if let Some(path) = output {
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        info!("Current conditions saved to {}", path.display());
    }

    Ok(())
}

async fn history(
    config: &Config,
    range: DateRange,
    frequency: Frequency,
    output: Option<String>,
) -> anyhow::Result<()> {
    let mut transport = HttpTransport::new(&config.http)?;
    if config.http.cache {
        transport = transport.with_cache(ResponseCache::new(Config::cache_dir()?));
    }

    let client = ArchiveClient::new(transport, config.archive.clone());
    let series = client.fetch_historical(&range, frequency).await?;

    info!("date, {}", series.columns().join(", "));
    for (ts, values) in series.head(HEAD_ROWS) {
        info!("{ts}, {values:?}");
    }

    if let Some(name) = output {
        let path = csv_file_name(&name);
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create output file: {path}"))?;
        series
            .write_csv(file)
            .with_context(|| format!("Failed to write output file: {path}"))?;
        info!(
            "Historical data saved to {path}. Lines: {}",
            series.row_count()
        );
    }

    Ok(())
}

fn csv_file_name(name: &str) -> String {
    if name.ends_with(".csv") {
        name.to_string()
    } else {
        format!("{name}.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_flags_parse() {
        let cli = Cli::try_parse_from([
            "skystats",
            "history",
            "-s",
            "2020-01-01",
            "-e",
            "2020-02-01",
            "-f",
            "hourly",
            "-o",
            "hanoi",
        ])
        .expect("valid arguments");

        match cli.command {
            Command::History {
                start_date,
                end_date,
                frequency,
                output,
            } => {
                assert_eq!(start_date, "2020-01-01");
                assert_eq!(end_date, "2020-02-01");
                assert_eq!(frequency, Frequency::Hourly);
                assert_eq!(output.as_deref(), Some("hanoi"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_frequency_is_rejected_by_parser() {
        let err = Cli::try_parse_from([
            "skystats",
            "history",
            "--start-date",
            "2020-01-01",
            "--end-date",
            "2020-02-01",
            "--frequency",
            "weekly",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("weekly"));
    }

    #[test]
    fn history_requires_dates() {
        let result = Cli::try_parse_from(["skystats", "history", "-f", "daily"]);
        assert!(result.is_err());
    }

    #[test]
    fn current_accepts_url_overrides() {
        let cli = Cli::try_parse_from([
            "skystats",
            "current",
            "--air-url",
            "https://air.example",
            "-o",
            "now.json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Current {
                air_url: Some(_),
                weather_url: None,
                output: Some(_)
            }
        ));
    }

    #[test]
    fn csv_extension_added_once() {
        assert_eq!(csv_file_name("hanoi"), "hanoi.csv");
        assert_eq!(csv_file_name("hanoi.csv"), "hanoi.csv");
    }
}
