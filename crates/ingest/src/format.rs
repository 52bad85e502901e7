//! Human-readable byte counts.
//!
//! Sizes are rendered in base-1024 units (`Bytes`, `KB`, `MB`, `GB`), rounded
//! to two decimals with trailing zeros dropped: `1536` renders as `"1.5 KB"`
//! and `1024` as `"1 KB"`.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const STEP: u64 = 1024;

/// Formats a byte count for display.
///
/// The unit index is `floor(log1024(bytes))`, clamped to `GB`; anything larger
/// is expressed in gigabytes.
///
/// # Examples
///
/// ```rust
/// use ingest::format_file_size;
///
/// assert_eq!(format_file_size(0), "0 Bytes");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut index = 0;
    let mut divisor = 1u64;
    while index + 1 < UNITS.len() && bytes / divisor >= STEP {
        divisor *= STEP;
        index += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let rounded = (value * 100.0).round() / 100.0;
    // f64's Display drops trailing zeros ("1", "1.5", "1.25").
    format!("{rounded} {}", UNITS[index])
}
