// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

/// Formats a position in seconds into a human-readable `MM:SS` string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_time(65.4), "01:05");
/// assert_eq!(format_time(3600.0), "60:00");
/// ```
pub(crate) fn format_time(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let mins = total_seconds / 60;
    let secs = total_seconds % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// Left-pads a numeric string with zeros to `width` digits.
///
/// Anything that is not a plain number is returned unchanged, trimmed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(pad_number("7", 3), "007");
/// assert_eq!(pad_number("120", 2), "120");
/// ```
pub(crate) fn pad_number(value: &str, width: usize) -> String {
    let value = value.trim();
    match value.parse::<u32>() {
        Ok(n) => format!("{:0width$}", n, width = width),
        Err(_) => value.to_string(),
    }
}
