use anyhow::{Context, Result};
use citycast::config::CitycastConfig;
use citycast::display::render_dashboard;
use citycast::telemetry::init_tracing;
use citycast::{
    CityStore, CitycastError, Dashboard, FjallCityStore, RefreshPhase, TemperatureUnit,
    WeatherApiClient,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "citycast", version, about = "Weather dashboard for your tracked cities")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tracked cities
    List,
    /// Track one or more cities
    Add {
        #[arg(required = true)]
        cities: Vec<String>,
    },
    /// Stop tracking a city
    Remove { city: String },
    /// Suggest city names for a partial query
    Search { query: String },
    /// Fetch and print the dashboard once
    Show {
        #[arg(short, long)]
        fahrenheit: bool,
    },
    /// Keep the dashboard on screen; keys: r refresh, a auto-refresh, u units, q quit
    Watch {
        #[arg(short, long)]
        fahrenheit: bool,
        /// Refresh interval in seconds (implies --auto-refresh)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(10..=86_400))]
        interval: Option<u64>,
        /// Start with auto-refresh on, whatever the config says
        #[arg(long, conflicts_with = "no_auto_refresh")]
        auto_refresh: bool,
        /// Start with auto-refresh off, whatever the config says
        #[arg(long)]
        no_auto_refresh: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(hint) = e.chain().find_map(|c| c.downcast_ref::<CitycastError>()) {
                eprintln!("{}", hint.user_message());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = CitycastConfig::load_from_path(args.config)?;
    init_tracing(&config.logging, args.verbose)?;

    let store_path = config.storage.resolved_path();
    let store = Arc::new(
        FjallCityStore::open(&store_path)
            .with_context(|| format!("Cannot use storage path {}", store_path.display()))?,
    );

    let icons = config.weather.icon_base_url.as_str();
    match args.command {
        Command::List => {
            let cities = store.load().await?;
            if cities.is_empty() {
                println!("No cities tracked.");
            }
            for city in cities {
                println!("{city}");
            }
        }
        Command::Add { cities } => {
            let dashboard = open_dashboard(&config, store, None).await?;
            for city in &cities {
                if !dashboard.add_city(city).await {
                    println!("'{}' is already tracked or not a valid name", city.trim());
                }
            }
            print!("{}", render_dashboard(&dashboard.snapshot(), icons));
        }
        Command::Remove { city } => {
            let dashboard = open_dashboard(&config, store, None).await?;
            if !dashboard.remove_city(&city).await {
                println!("'{city}' is not tracked");
            }
            print!("{}", render_dashboard(&dashboard.snapshot(), icons));
        }
        Command::Search { query } => {
            let dashboard = open_dashboard(&config, store, None).await?;
            let suggestions = dashboard.search(&query).await;
            if suggestions.is_empty() {
                println!("No suggestions for '{query}'");
            }
            for suggestion in suggestions {
                println!("{suggestion}");
            }
        }
        Command::Show { fahrenheit } => {
            let dashboard = open_dashboard(&config, store, None).await?;
            dashboard.set_unit(unit_for(fahrenheit));
            dashboard.refresh().await;
            print!("{}", render_dashboard(&dashboard.snapshot(), icons));
        }
        Command::Watch {
            fahrenheit,
            interval,
            auto_refresh,
            no_auto_refresh,
        } => {
            let auto = starts_auto_refresh(
                config.refresh.auto_refresh,
                interval.is_some(),
                auto_refresh,
                no_auto_refresh,
            );
            let interval = interval.map(Duration::from_secs);
            let dashboard = open_dashboard(&config, store, interval).await?;
            dashboard.set_unit(unit_for(fahrenheit));
            watch(&dashboard, icons, auto).await?;
        }
    }

    Ok(())
}

async fn open_dashboard(
    config: &CitycastConfig,
    store: Arc<FjallCityStore>,
    interval: Option<Duration>,
) -> Result<Arc<Dashboard>> {
    let client = Arc::new(WeatherApiClient::new(&config.weather)?);
    let interval = interval.unwrap_or_else(|| config.refresh.interval());
    Ok(Dashboard::restore(client, store, interval).await)
}

fn unit_for(fahrenheit: bool) -> TemperatureUnit {
    if fahrenheit {
        TemperatureUnit::Fahrenheit
    } else {
        TemperatureUnit::Celsius
    }
}

/// `--no-auto-refresh` wins over the config, `--auto-refresh` and `--interval`
fn starts_auto_refresh(configured: bool, has_interval: bool, on: bool, off: bool) -> bool {
    !off && (on || has_interval || configured)
}

/// A line typed while watching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchKey {
    Refresh,
    ToggleAutoRefresh,
    ToggleUnit,
    Quit,
}

impl WatchKey {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "r" | "refresh" => Some(Self::Refresh),
            "a" | "auto" => Some(Self::ToggleAutoRefresh),
            "u" | "units" => Some(Self::ToggleUnit),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

const WATCH_HINT: &str = "[r] refresh  [a] auto-refresh on/off  [u] °C/°F  [q] quit";

/// Redraw after every settled change until Ctrl-C or `q`
async fn watch(dashboard: &Arc<Dashboard>, icons: &str, auto_refresh: bool) -> Result<()> {
    let mut updates = dashboard.subscribe();
    dashboard.refresh().await;
    dashboard.set_auto_refresh(auto_refresh);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut keys = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut drawn = None;
    loop {
        let snapshot = updates.borrow_and_update().clone();
        let settled = snapshot.in_flight == 0 && snapshot.phase != RefreshPhase::Fetching;
        let key = (
            snapshot.last_refreshed,
            snapshot.error.clone(),
            snapshot.phase,
            snapshot.unit,
            snapshot.auto_refresh,
        );
        if settled && drawn.as_ref() != Some(&key) {
            let auto = if snapshot.auto_refresh { "on" } else { "off" };
            print!("\x1B[2J\x1B[H{}", render_dashboard(&snapshot, icons));
            println!("\nAuto-refresh {auto}. {WATCH_HINT}");
            drawn = Some(key);
        }

        tokio::select! {
            signal = &mut shutdown => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = keys.next_line(), if stdin_open => {
                match line.context("Failed to read from stdin")? {
                    None => stdin_open = false,
                    Some(line) => match WatchKey::parse(&line) {
                        Some(WatchKey::Refresh) => {
                            dashboard.refresh().await;
                        }
                        Some(WatchKey::ToggleAutoRefresh) => {
                            dashboard.set_auto_refresh(!snapshot.auto_refresh);
                        }
                        Some(WatchKey::ToggleUnit) => {
                            dashboard.toggle_unit();
                        }
                        Some(WatchKey::Quit) => break,
                        None => println!("{WATCH_HINT}"),
                    },
                }
            }
        }
    }

    dashboard.stop_auto_refresh();
    info!("Stopped watching");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("r", Some(WatchKey::Refresh))]
    #[case(" Refresh\n", Some(WatchKey::Refresh))]
    #[case("a", Some(WatchKey::ToggleAutoRefresh))]
    #[case("U", Some(WatchKey::ToggleUnit))]
    #[case("q", Some(WatchKey::Quit))]
    #[case("", None)]
    #[case("x", None)]
    fn test_watch_key_parse(#[case] line: &str, #[case] expected: Option<WatchKey>) {
        assert_eq!(WatchKey::parse(line), expected);
    }

    #[rstest]
    #[case(false, false, false, false, false)]
    #[case(true, false, false, false, true)]
    #[case(false, true, false, false, true)]
    #[case(false, false, true, false, true)]
    #[case(true, true, false, true, false)]
    fn test_starts_auto_refresh(
        #[case] configured: bool,
        #[case] has_interval: bool,
        #[case] on: bool,
        #[case] off: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(starts_auto_refresh(configured, has_interval, on, off), expected);
    }

    #[test]
    fn test_watch_flags_conflict() {
        let parsed =
            Args::try_parse_from(["citycast", "watch", "--auto-refresh", "--no-auto-refresh"]);
        assert!(parsed.is_err());
    }
}
