//! Plain-text rendering of dashboard snapshots

use crate::dashboard::DashboardSnapshot;
use crate::models::{CurrentConditions, ForecastSeries, TemperatureUnit};
use std::fmt::Write;

const NO_DATA: &str = "No data available";
const NO_FORECAST: &str = "No forecast available";

/// Render one card per tracked city, in list order, with the error line on top
#[must_use]
pub fn render_dashboard(snapshot: &DashboardSnapshot, icon_base_url: &str) -> String {
    let mut out = String::new();

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "! {error}");
        out.push('\n');
    }

    if snapshot.cities.is_empty() {
        out.push_str("No cities tracked. Add one with `citycast add <CITY>`.\n");
        return out;
    }

    for (i, city) in snapshot.cities.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_card(
            &mut out,
            city,
            snapshot.current_for(city),
            snapshot.forecast_for(city),
            snapshot.unit,
            icon_base_url,
        );
    }

    if let Some(at) = snapshot.last_refreshed {
        let _ = writeln!(
            out,
            "\nRefreshed {}",
            at.with_timezone(&chrono::Local).format("%H:%M:%S")
        );
    }
    out
}

fn render_card(
    out: &mut String,
    city: &str,
    current: Option<&CurrentConditions>,
    forecast: Option<&ForecastSeries>,
    unit: TemperatureUnit,
    icon_base_url: &str,
) {
    let _ = writeln!(out, "== {city} ==");

    match current {
        Some(c) => {
            let _ = writeln!(out, "  {}  {}", c.format_temperature(unit), c.description);
            let _ = writeln!(
                out,
                "  Humidity {}  Wind {}  Pressure {}",
                c.format_humidity(),
                c.format_wind(),
                c.format_pressure()
            );
            let _ = writeln!(out, "  Last updated {}", c.format_observed_at());
            let _ = writeln!(out, "  Icon {}", c.icon_url(icon_base_url));
        }
        None => {
            let _ = writeln!(out, "  {NO_DATA}");
        }
    }

    match forecast {
        Some(days) if !days.is_empty() => {
            for day in days {
                let _ = writeln!(
                    out,
                    "  {:<12} {:>6}  {}",
                    day.format_date(),
                    day.format_temperature(unit),
                    day.description
                );
            }
        }
        _ => {
            let _ = writeln!(out, "  {NO_FORECAST}");
        }
    }
}
