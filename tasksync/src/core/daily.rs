//! Date-partitioned layout of daily entries.
//!
//! Entries live at `<root>/<YYYY>/<MM>/<DD>.<ext>`, locally and on the relay.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

/// Zero-padded `(year, month, day)` components for `date`.
pub fn date_components(date: NaiveDate) -> [String; 3] {
    [
        format!("{:04}", date.year()),
        format!("{:02}", date.month()),
        format!("{:02}", date.day()),
    ]
}

/// Local journal path for `date`.
pub fn daily_file_path(root: &Path, date: NaiveDate, extension: &str) -> PathBuf {
    let [year, month, day] = date_components(date);
    root.join(year).join(month).join(file_name(&day, extension))
}

/// Relay path for `date`, always `/`-separated.
pub fn daily_relay_path(dir: &str, date: NaiveDate, extension: &str) -> String {
    let [year, month, day] = date_components(date);
    let name = file_name(&day, extension);
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        format!("{year}/{month}/{name}")
    } else {
        format!("{dir}/{year}/{month}/{name}")
    }
}

fn file_name(day: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        day.to_string()
    } else {
        format!("{day}.{extension}")
    }
}
