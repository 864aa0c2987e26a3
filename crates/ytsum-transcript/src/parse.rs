//! Response parsing for transcript sources.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use ytsum_models::{parse_timestamped_line, TranscriptSegment, SYNTHETIC_SEGMENT_SECS};

use crate::error::{TranscriptError, TranscriptResult};

/// Structured entry as returned by the backend.
#[derive(Debug, Deserialize)]
struct StructuredEntry {
    text: String,
    start: f64,
    #[serde(default)]
    duration: Option<f64>,
}

/// Parse the backend `timestamps` payload.
///
/// Accepts a JSON array whose entries are either `"M:SS - text"` strings or
/// `{text, start, duration}` objects, optionally wrapped in an object under
/// `segments` or `transcript`. String entries take their duration from the gap
/// to the next entry; the last one gets 2 seconds.
pub fn parse_timestamp_entries(value: &Value) -> TranscriptResult<Vec<TranscriptSegment>> {
    let entries = value
        .as_array()
        .or_else(|| value.get("segments").and_then(Value::as_array))
        .or_else(|| value.get("transcript").and_then(Value::as_array))
        .ok_or_else(|| TranscriptError::invalid_response("timestamps payload is not an array"))?;

    let mut parsed: Vec<(String, f64, Option<f64>)> = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::String(line) => match parse_timestamped_line(line) {
                Some((start, text)) => parsed.push((text, start, None)),
                None => debug!(line = %line, "Skipping unparsable timestamp line"),
            },
            Value::Object(_) => match StructuredEntry::deserialize(entry) {
                Ok(e) if !e.text.trim().is_empty() => {
                    parsed.push((e.text.trim().to_string(), e.start, e.duration))
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Skipping malformed transcript entry"),
            },
            _ => debug!("Skipping non-string transcript entry"),
        }
    }

    let starts: Vec<f64> = parsed.iter().map(|(_, start, _)| *start).collect();
    let segments = parsed
        .into_iter()
        .enumerate()
        .map(|(i, (text, start, duration))| {
            let duration = duration.unwrap_or_else(|| {
                starts
                    .get(i + 1)
                    .map(|next| next - start)
                    .filter(|gap| *gap > 0.0)
                    .unwrap_or(SYNTHETIC_SEGMENT_SECS)
            });
            TranscriptSegment::new(text, start, duration)
        })
        .collect();

    Ok(segments)
}

/// Parse a YouTube timedtext `json3` document.
///
/// Each event carries `tStartMs`, `dDurationMs` and `segs[].utf8` pieces.
/// Events without text are dropped.
pub fn parse_json3(value: &Value) -> Vec<TranscriptSegment> {
    let Some(events) = value.get("events").and_then(Value::as_array) else {
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| {
            let text = event
                .get("segs")?
                .as_array()?
                .iter()
                .filter_map(|seg| seg.get("utf8").and_then(Value::as_str))
                .collect::<String>();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }

            let start_ms = event.get("tStartMs").and_then(Value::as_f64).unwrap_or(0.0);
            let duration = event
                .get("dDurationMs")
                .and_then(Value::as_f64)
                .map(|ms| ms / 1000.0)
                .unwrap_or(SYNTHETIC_SEGMENT_SECS);

            Some(TranscriptSegment::new(text, start_ms / 1000.0, duration))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_strings() {
        let value = json!([
            "0:00 - We're no strangers to love",
            "0:04 - You know the rules",
            "garbage line",
            "1:00:10 - and so do I"
        ]);

        let segments = parse_timestamp_entries(&value).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], TranscriptSegment::new("We're no strangers to love", 0.0, 4.0));
        assert_eq!(segments[1].start, 4.0);
        assert_eq!(segments[1].duration, 3606.0);
        assert_eq!(segments[2], TranscriptSegment::new("and so do I", 3610.0, 2.0));
    }

    #[test]
    fn test_parse_structured_entries() {
        let value = json!([
            {"text": "hello", "start": 0.5, "duration": 1.25},
            {"text": "  ", "start": 2.0, "duration": 1.0},
            {"text": "world", "start": 2.0}
        ]);

        let segments = parse_timestamp_entries(&value).unwrap();
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new("hello", 0.5, 1.25),
                TranscriptSegment::new("world", 2.0, 2.0),
            ]
        );
    }

    #[test]
    fn test_parse_wrapped_payload() {
        let value = json!({"segments": ["0:01 - hi"]});
        assert_eq!(parse_timestamp_entries(&value).unwrap().len(), 1);

        let value = json!({"transcript": []});
        assert!(parse_timestamp_entries(&value).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_timestamp_entries(&json!({"error": "nope"})),
            Err(TranscriptError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_json3() {
        let value = json!({
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "Never "}, {"utf8": "gonna"}]},
                {"tStartMs": 1500, "dDurationMs": 500, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 2000},
                {"tStartMs": 3000, "segs": [{"utf8": "give\nyou up"}]}
            ]
        });

        let segments = parse_json3(&value);
        assert_eq!(
            segments,
            vec![
                TranscriptSegment::new("Never gonna", 0.0, 1.5),
                TranscriptSegment::new("give you up", 3.0, 2.0),
            ]
        );
        assert!(parse_json3(&json!({})).is_empty());
    }
}
