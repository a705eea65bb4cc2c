use anyhow::{Context, Result};
use chrono::{DateTime, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use pulse_availability::config::{LogFormat, LoggingSettings, Settings};
use pulse_availability::domain::{
    Coordinate, DayOfWeek, Distance, DistanceUnit, SpecialCategory, ValidationError, VenueId,
};
use pulse_availability::{Application, SearchRequest, SearchTime};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Find venues that are open and specials that are running near a point
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about)]
struct Cli {
    /// Settings file to load instead of config/ and PULSE__* variables
    #[arg(long, global = true)]
    config: Option<String>,

    /// Catalog file, overriding the configured path
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Venues within a radius, nearest first
    Search(SearchArgs),
    /// Opening hours and specials of one venue
    Venue(VenueArgs),
    /// Print the catalog as loaded, with every schedule day filled in
    Catalog,
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Defaults to the configured radius
    #[arg(long)]
    radius: Option<f64>,

    /// `miles` or `km`; defaults to the configured unit
    #[arg(long)]
    unit: Option<DistanceUnit>,

    #[command(flatten)]
    when: WhenArgs,

    #[arg(long)]
    open_only: bool,

    /// Only venues with a special running
    #[arg(long)]
    running_only: bool,

    /// food, drink or entertainment
    #[arg(long)]
    category: Option<SpecialCategory>,
}

#[derive(Debug, Args)]
struct VenueArgs {
    id: Uuid,

    #[command(flatten)]
    when: WhenArgs,
}

#[derive(Debug, Args)]
struct WhenArgs {
    /// Evaluate at this RFC 3339 instant instead of now
    #[arg(long, conflicts_with_all = ["day", "time"])]
    at: Option<DateTime<Utc>>,

    /// Evaluate on the next such weekday, in each venue's local time
    #[arg(long, requires = "time")]
    day: Option<DayOfWeek>,

    /// Local HH:MM, used with --day
    #[arg(long, requires = "day", value_parser = parse_time)]
    time: Option<NaiveTime>,
}

impl WhenArgs {
    fn search_time(&self) -> SearchTime {
        match (self.at, self.day, self.time) {
            (Some(at), _, _) => SearchTime::At(at),
            (None, Some(day), Some(time)) => SearchTime::Weekly { day, time },
            _ => SearchTime::Now,
        }
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
}

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {path}"))?,
        None => Settings::new().context("loading settings")?,
    };
    if let Some(catalog) = &cli.catalog {
        settings.catalog.path = catalog.clone();
    }
    Ok(settings)
}

fn search_request(args: &SearchArgs, settings: &Settings) -> Result<SearchRequest> {
    let unit = args.unit.unwrap_or(settings.search.unit);
    let radius = match args.radius {
        Some(value) => Distance::try_new(value, unit)?,
        None => settings.default_radius()?.to_unit(unit),
    };

    Ok(SearchRequest {
        when: args.when.search_time(),
        open_only: args.open_only,
        running_only: args.running_only,
        category: args.category,
        ..SearchRequest::new(Coordinate::try_new(args.lat, args.lon)?, radius)
    })
}

async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let app = Application::with_settings(settings).await?;

    let output = match &cli.command {
        Command::Search(args) => {
            let request = search_request(args, app.settings())?;
            debug!(?request, "running search");
            serde_json::to_string_pretty(&app.search().search(&request).await?)?
        }
        Command::Venue(args) => {
            let status = app
                .search()
                .venue_status(VenueId::new(args.id), args.when.search_time())
                .await?;
            serde_json::to_string_pretty(&status)?
        }
        Command::Catalog => serde_json::to_string_pretty(&app.catalog().to_document())?,
    };

    println!("{output}");
    Ok(())
}

// Bad input exits with 2, everything else with 1
fn exit_status(error: &anyhow::Error) -> u8 {
    let client_error = match error.downcast_ref::<pulse_availability::Error>() {
        Some(error) => error.is_client_error(),
        None => error.is::<ValidationError>(),
    };
    if client_error {
        2
    } else {
        1
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("pulse: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings.logging);
    info!("Starting Pulse");

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pulse failed");
            ExitCode::from(exit_status(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_availability::domain::ConfigurationError;

    #[test]
    fn client_errors_exit_with_two() {
        let not_found = anyhow::Error::from(pulse_availability::Error::not_found("venue 42"));
        assert_eq!(exit_status(&not_found), 2);

        let bad_input = anyhow::Error::from(ValidationError::EmptyWeekdaySet);
        assert_eq!(exit_status(&bad_input), 2);
    }

    #[test]
    fn system_errors_exit_with_one() {
        let unknown_zone = pulse_availability::Error::from(ConfigurationError::UnknownTimeZone(
            "Mars/Olympus".into(),
        ));
        assert_eq!(exit_status(&anyhow::Error::from(unknown_zone)), 1);
        assert_eq!(exit_status(&anyhow::anyhow!("disk on fire")), 1);
    }

    #[test]
    fn day_and_time_select_a_weekly_search() {
        let cli = Cli::try_parse_from([
            "pulse", "search", "--lat", "41.9", "--lon", "-87.6", "--day", "fri", "--time", "18:00",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected a search");
        };
        assert_eq!(
            args.when.search_time(),
            SearchTime::Weekly {
                day: DayOfWeek::Friday,
                time: NaiveTime::from_hms_opt(18, 0, 0).unwrap()
            }
        );
    }
}
