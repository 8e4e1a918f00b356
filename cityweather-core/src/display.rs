//! Formatting helpers shared by front-ends.

use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

/// Human-readable label for an OpenWeather air quality index.
pub fn aqi_label(aqi: i64) -> &'static str {
    match aqi {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        _ => "Unknown",
    }
}

/// Hour of day in 12-hour form, e.g. `"3 PM"`, in the given time zone.
pub fn format_hour_in<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String {
    let Some(utc) = DateTime::from_timestamp(timestamp, 0) else {
        return "--".to_string();
    };
    let hour = utc.with_timezone(tz).hour();
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12} {suffix}")
}

/// [`format_hour_in`] for the machine's local time zone.
pub fn format_hour(timestamp: i64) -> String {
    format_hour_in(timestamp, &Local)
}

/// Wall-clock time of an observation as `HH:MM` in the given time zone.
pub fn format_observed_in<Tz: TimeZone>(time: &DateTime<Utc>, tz: &Tz) -> String {
    let local = time.with_timezone(tz);
    format!("{:02}:{:02}", local.hour(), local.minute())
}

pub fn format_observed(time: &DateTime<Utc>) -> String {
    format_observed_in(time, &Local)
}

pub fn icon_url(icon: &str) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@2x.png")
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}
