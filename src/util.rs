//! Utility functions with platform-specific implementations.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;

/// Get current time as milliseconds since Unix epoch.
///
/// On native platforms, uses `SystemTime::now()`.
/// On WASM, uses `js_sys::Date::now()`.
#[cfg(not(target_arch = "wasm32"))]
pub fn time_now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(target_arch = "wasm32")]
pub fn time_now_millis() -> i64 {
    js_sys::Date::now() as i64
}

/// Current instant as a UTC timestamp.
pub fn now_utc() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(time_now_millis()).unwrap_or_default()
}

/// Today's date in UTC, as used in default filenames.
pub fn today_utc() -> NaiveDate {
    now_utc().date_naive()
}

/// Write through a sibling temp file so readers never observe a partial file.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Strip path separators so a filename cannot escape its target directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "export".to_string(),
        _ => cleaned,
    }
}
