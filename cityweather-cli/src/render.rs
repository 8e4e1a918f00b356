//! Plain-text rendering of the view state.

use cityweather_core::{
    ViewState,
    display::{aqi_label, format_hour, format_observed, format_temperature, icon_url},
};

const LOADING: &str = "Loading...";

fn row(title: &str, value: impl std::fmt::Display) -> String {
    format!("  {title:<12} {value}")
}

/// Draw the three sections the same way the screen does: while loading every
/// section shows the spinner line, and an error replaces all of them.
pub fn render(state: &ViewState) -> String {
    let mut out = vec![format!("City: {}", state.search_term), String::new()];

    if state.loading {
        out.push(LOADING.to_string());
    }
    if let Some(error) = &state.error {
        out.push(format!("! {error}"));
    }

    if let (Some(weather), None) = (&state.weather, &state.error) {
        out.push(format!(
            "Now: {} (observed {})",
            weather.location_name,
            format_observed(&weather.observation_time)
        ));
        out.push(row("Temperature", format!("{} °C", weather.temperature_c)));
        out.push(row("Condition", &weather.description));
        out.push(row("Icon", icon_url(&weather.icon)));
        out.push(row("Humidity", format!("{} %", weather.humidity_pct)));
        out.push(row("Pressure", format!("{} hPa", weather.pressure_hpa)));
        out.push(row("Wind Speed", format!("{} m/s", weather.wind_speed_mps)));
    }

    out.push(String::new());
    match (&state.pollution, state.loading, &state.error) {
        (Some(pollution), false, None) => out.push(format!(
            "Air Pollution Data (observed {})",
            format_observed(&pollution.observation_time)
        )),
        _ => out.push("Air Pollution Data".to_string()),
    }
    if state.loading {
        out.push(format!("  {LOADING}"));
    } else if let Some(error) = &state.error {
        out.push(format!("  {error}"));
    } else if let Some(pollution) = &state.pollution {
        out.push(format!("  AQI: {} ({})", pollution.aqi, aqi_label(pollution.aqi)));
        for (name, value) in &pollution.components {
            out.push(row(&pollutant_name(name), format!("{value} μg/m³")));
        }
    } else {
        out.push("  No data available".to_string());
    }

    out.push(String::new());
    out.push("3-Hour Forecast (Next 24 Hours)".to_string());
    if state.loading {
        out.push(format!("  {LOADING}"));
    } else if let Some(error) = &state.error {
        out.push(format!("  {error}"));
    } else {
        for entry in &state.forecast {
            out.push(format!(
                "  {:>5}  {:>7}  {:<20} {}",
                format_hour(entry.dt),
                format_temperature(entry.temperature_c),
                entry.description,
                icon_url(&entry.icon),
            ));
        }
    }

    out.join("\n")
}

fn pollutant_name(key: &str) -> String {
    match key {
        "pm2_5" => "PM2.5".to_string(),
        "o3" => "O₃".to_string(),
        other => other.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cityweather_core::{Coordinates, ForecastEntry, PollutionSnapshot, WeatherSnapshot};
    use std::collections::BTreeMap;

    fn loaded_state() -> ViewState {
        ViewState {
            search_term: "Paris".into(),
            weather: Some(WeatherSnapshot {
                location_name: "Paris".into(),
                observation_time: Utc::now(),
                temperature_c: 18.4,
                humidity_pct: 64,
                pressure_hpa: 1017.0,
                wind_speed_mps: 3.6,
                description: "clear sky".into(),
                icon: "01d".into(),
                coord: Coordinates { lat: 48.85, lon: 2.35 },
            }),
            pollution: Some(PollutionSnapshot {
                aqi: 3,
                observation_time: Utc::now(),
                components: BTreeMap::from([("co".into(), 201.94), ("pm2_5".into(), 0.5)]),
            }),
            forecast: vec![ForecastEntry {
                dt: 1_718_000_000,
                temperature_c: 12.345,
                description: "light rain".into(),
                icon: "10n".into(),
            }],
            ..ViewState::default()
        }
    }

    #[test]
    fn renders_all_sections() {
        let text = render(&loaded_state());

        assert!(text.contains("Now: Paris (observed "));
        assert!(text.contains("Air Pollution Data (observed "));
        assert!(text.contains("64 %"));
        assert!(text.contains("1017 hPa"));
        assert!(text.contains("3.6 m/s"));
        assert!(text.contains("https://openweathermap.org/img/wn/01d@2x.png"));
        assert!(text.contains("AQI: 3 (Moderate)"));
        assert!(text.contains("PM2.5"));
        assert!(text.contains("201.94 μg/m³"));
        assert!(text.contains("12.3°C"));
        assert!(text.contains("light rain"));
        assert!(!text.contains(LOADING));
    }

    #[test]
    fn error_replaces_every_section() {
        let state = ViewState {
            error: Some("city not found".into()),
            ..loaded_state()
        };
        let text = render(&state);

        assert_eq!(text.matches("city not found").count(), 3);
        assert!(!text.contains("Now: Paris"));
        assert!(!text.contains("AQI"));
        assert!(!text.contains("observed"));
    }

    #[test]
    fn loading_shows_in_every_section() {
        let state = ViewState {
            loading: true,
            ..ViewState::default()
        };
        let text = render(&state);

        assert_eq!(text.matches(LOADING).count(), 3);
    }

    #[test]
    fn empty_state_has_no_pollution_data() {
        let text = render(&ViewState::default());
        assert!(text.contains("No data available"));
    }
}
