//! Timestamp parsing utilities.
//!
//! The transcript backend renders timed lines as `M:SS - text` or
//! `H:MM:SS - text`. These helpers turn them back into seconds.

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `H:MM:SS` or `HH:MM:SS.mmm`
/// - `M:SS` or `MM:SS.mmm`
/// - `SS` or `SS.mmm`
///
/// # Examples
/// ```
/// use ytsum_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("1:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("5:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    // Fold from the most significant component: ((h * 60) + m) * 60 + s
    let mut total = 0.0;
    for (idx, part) in parts.iter().enumerate() {
        let component = match parts.len() - idx {
            3 => "hours",
            2 => "minutes",
            _ => "seconds",
        };
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(component, part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total = total * 60.0 + value;
    }

    Ok(total)
}

/// Format seconds as a clock label: `M:SS`, or `H:MM:SS` past the hour.
pub fn format_timestamp(total_secs: f64) -> String {
    let total = total_secs.max(0.0).floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Split a `M:SS - text` line into its start offset and text.
///
/// Returns `None` for lines without a leading timestamp or with empty text.
pub fn parse_timestamped_line(line: &str) -> Option<(f64, String)> {
    let (ts, text) = line.trim().split_once(" - ")?;
    let start = parse_timestamp(ts).ok()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some((start, text.to_string()))
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp contains negative values
    Negative,
    /// Invalid numeric value for a component
    InvalidValue(&'static str, String),
    /// Invalid timestamp format
    InvalidFormat(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative => write!(f, "Timestamp cannot be negative"),
            Self::InvalidValue(component, value) => {
                write!(f, "Invalid {} value: {}", component, value)
            }
            Self::InvalidFormat(ts) => write!(
                f,
                "Invalid timestamp format '{}'. Use H:MM:SS, M:SS, or SS",
                ts
            ),
        }
    }
}

impl std::error::Error for TimestampError {}
