use chrono::{DateTime, SecondsFormat, Utc};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

/// Get the configuration directory path for Cityscape
/// If profile is Dev, uses "cityscape-dev" instead of "cityscape"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "cityscape-dev",
        Profile::Prod => "cityscape",
    };
    // Use "com" as qualifier for better cross-platform compatibility
    ProjectDirs::from("com", "cityscape", app_name).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for Cityscape
/// If profile is Dev, uses "cityscape-dev" instead of "cityscape"
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    let app_name = match profile {
        Profile::Dev => "cityscape-dev",
        Profile::Prod => "cityscape",
    };
    ProjectDirs::from("com", "cityscape", app_name).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<chrono::NaiveDate, chrono::ParseError> {
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Current instant as an RFC 3339 string with millisecond precision, the same
/// shape `Date.prototype.toISOString` writes into the persisted records
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored ISO 8601 timestamp. Returns None for anything unparseable
/// so callers can drop bad records instead of failing a whole view.
pub fn parse_instant(iso: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Combine a calendar date and an HH:MM time into a UTC instant string
pub fn combine_date_time(date: chrono::NaiveDate, time: &str) -> Option<String> {
    let mut parts = time.splitn(2, ':');
    let hh: u32 = parts.next()?.parse().ok()?;
    let mm: u32 = parts.next().unwrap_or("0").parse().ok()?;
    let naive = date.and_hms_opt(hh, mm, 0)?;
    Some(naive.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_js_style_timestamps() {
        let ts = parse_instant("2026-08-25T10:00:00.000Z").unwrap();
        assert_eq!(
            ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            "2026-08-25T10:00:00.000Z"
        );
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_instant("not-a-date").is_none());
        assert!(parse_instant("").is_none());
    }

    #[test]
    fn combines_date_and_time() {
        let date = parse_date("2026-08-25").unwrap();
        let iso = combine_date_time(date, "10:30").unwrap();
        assert_eq!(iso, "2026-08-25T10:30:00.000Z");
    }

    #[test]
    fn round_trips_now() {
        assert!(parse_instant(&now_iso()).is_some());
    }
}
