//! Human-friendly durations such as `30s`, `15m`, `24h` or `3d`.

use gamebook_error::ConfigError;
use std::time::Duration;

/// Parses a period: a whole number followed by `s`, `m`, `h`, `d` or `w`.
///
/// A bare number counts seconds.
///
/// ```
/// use gamebook::parse_period;
/// use std::time::Duration;
///
/// assert_eq!(parse_period("24h").unwrap(), Duration::from_secs(86_400));
/// assert_eq!(parse_period("90").unwrap(), Duration::from_secs(90));
/// assert!(parse_period("soon").is_err());
/// ```
pub fn parse_period(text: &str) -> Result<Duration, ConfigError> {
    let text = text.trim();
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);

    let value: u64 = number
        .parse()
        .map_err(|_| ConfigError::new(format!("Invalid period '{}'", text)))?;
    let scale = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        other => {
            return Err(ConfigError::new(format!(
                "Unknown unit '{}' in period '{}' (use s, m, h, d or w)",
                other, text
            )));
        }
    };

    let seconds = value
        .checked_mul(scale)
        .ok_or_else(|| ConfigError::new(format!("Period '{}' is too long", text)))?;
    Ok(Duration::from_secs(seconds))
}
