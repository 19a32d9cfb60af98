// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! A single log record as the ingestion API expects it.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::config::Limits;
use crate::constants::{PER_EVENT_HEADER_BYTES, TRUNCATED_SUFFIX};
use crate::errors::ValidationError;

/// One log line and the time it was generated.
///
/// Serializes to the input event shape of a `PutLogEvents` request:
/// `{"timestamp": 1700000000000, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEvent {
    /// Milliseconds since the epoch, 0 when not known yet
    #[serde(rename = "timestamp")]
    timestamp_ms: i64,
    message: String,
}

impl LogEvent {
    /// Stores the raw inputs. Nothing is checked until [`LogEvent::validate`].
    #[must_use]
    pub fn new(timestamp_ms: i64, message: impl Into<String>) -> Self {
        LogEvent {
            timestamp_ms,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Bytes this event costs in a request, framing overhead included.
    #[must_use]
    pub fn payload_bytes(&self) -> usize {
        self.message.len() + PER_EVENT_HEADER_BYTES
    }

    /// Checks the event against the service rules, relative to the current time.
    ///
    /// See [`LogEvent::validate_at`].
    pub fn validate(&mut self, limits: &Limits) -> Result<(), ValidationError> {
        self.validate_at(now_ms(), limits)
    }

    /// Checks the event against the service rules, relative to `now_ms`.
    ///
    /// An unset timestamp becomes `now_ms`. A message too large for
    /// `limits.max_event_payload_bytes` is shortened in place and ends with
    /// [`TRUNCATED_SUFFIX`]; that is logged but is not an error.
    pub fn validate_at(&mut self, now_ms: i64, limits: &Limits) -> Result<(), ValidationError> {
        if self.message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }

        if self.timestamp_ms == 0 {
            self.timestamp_ms = now_ms;
        }

        let oldest = now_ms.saturating_sub(duration_ms(limits.max_event_age));
        let newest = now_ms.saturating_add(duration_ms(limits.max_event_future_skew));
        if self.timestamp_ms < oldest || self.timestamp_ms > newest {
            return Err(ValidationError::TimestampOutOfRange);
        }

        if self.payload_bytes() > limits.max_event_payload_bytes {
            let original_bytes = self.payload_bytes();
            self.truncate(limits.max_event_payload_bytes);
            warn!(
                "LOGS | Log event exceeds {} bytes ({original_bytes}), truncated",
                limits.max_event_payload_bytes
            );
        }

        Ok(())
    }

    /// Keeps as much content as fits in `max_payload_bytes` next to the marker.
    fn truncate(&mut self, max_payload_bytes: usize) {
        let mut end = max_payload_bytes
            .saturating_sub(PER_EVENT_HEADER_BYTES)
            .saturating_sub(TRUNCATED_SUFFIX.len())
            .min(self.message.len());
        // never split a multi-byte character
        while !self.message.is_char_boundary(end) {
            end -= 1;
        }
        self.message.truncate(end);
        self.message.push_str(TRUNCATED_SUFFIX);
    }
}

/// Milliseconds since the epoch, the time unit used for every event timestamp.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, duration_ms)
}

pub(crate) fn duration_ms(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_EVENT_PAYLOAD_BYTES;
    use std::time::Duration;
    use tracing_test::traced_test;

    const HOUR_MS: i64 = 60 * 60 * 1000;
    const DAY_MS: i64 = 24 * HOUR_MS;

    fn limits_with_max_event(max_event_payload_bytes: usize) -> Limits {
        Limits {
            max_event_payload_bytes,
            ..Limits::default()
        }
    }

    #[test]
    fn test_payload_bytes() {
        let message = "test message";
        let event = LogEvent::new(0, message);
        assert_eq!(event.payload_bytes(), message.len() + PER_EVENT_HEADER_BYTES);
    }

    #[test]
    fn test_validate_keeps_short_message() {
        let now = now_ms();
        let mut event = LogEvent::new(now, "short");
        assert!(event.validate(&Limits::default()).is_ok());
        assert_eq!(event.message(), "short");
        assert_eq!(event.timestamp_ms(), now);
    }

    #[test]
    fn test_validate_sets_missing_timestamp() {
        let mut event = LogEvent::new(0, "no timestamp");
        event.validate_at(1_700_000_000_000, &Limits::default()).unwrap();
        assert_eq!(event.timestamp_ms(), 1_700_000_000_000);
    }

    #[test]
    #[traced_test]
    fn test_validate_truncates_long_message() {
        let mut event = LogEvent::new(
            0,
            "abcdefghijklmnopqrstuvwxyz0123456789abcdefghijklmnopqrstuvwxyz0123456789abcdefghijklmnopqrstuvwxyz0123456789",
        );
        assert!(event.validate(&limits_with_max_event(64)).is_ok());

        assert!(event.timestamp_ms() > 0);
        assert_eq!(event.payload_bytes(), 64);
        assert_eq!(event.message().len(), 64 - PER_EVENT_HEADER_BYTES);
        assert_eq!(event.message(), "abcdefghijklmnopqrstuvwx[Truncated...]");
        assert!(logs_contain("truncated"));
    }

    #[test]
    fn test_validate_truncates_default_limit() {
        let content = "a".repeat(DEFAULT_MAX_EVENT_PAYLOAD_BYTES);
        let expected = format!(
            "{}{TRUNCATED_SUFFIX}",
            &content[..DEFAULT_MAX_EVENT_PAYLOAD_BYTES - PER_EVENT_HEADER_BYTES - TRUNCATED_SUFFIX.len()]
        );

        let mut event = LogEvent::new(now_ms(), content);
        event.validate(&Limits::default()).unwrap();
        assert_eq!(event.message(), expected);
        assert_eq!(event.payload_bytes(), DEFAULT_MAX_EVENT_PAYLOAD_BYTES);
    }

    #[test]
    fn test_validate_truncation_respects_char_boundaries() {
        // 'é' is two bytes, the cut point falls in the middle of one
        let mut event = LogEvent::new(0, "é".repeat(40));
        event.validate_at(1_000 * DAY_MS, &limits_with_max_event(65)).unwrap();

        assert!(event.payload_bytes() <= 65);
        assert!(event.message().ends_with(TRUNCATED_SUFFIX));
        assert_eq!(event.message().len(), 24 + TRUNCATED_SUFFIX.len());
    }

    #[test]
    fn test_validate_exact_limit_is_untouched() {
        let message = "x".repeat(64 - PER_EVENT_HEADER_BYTES);
        let mut event = LogEvent::new(0, message.clone());
        event.validate_at(1_000 * DAY_MS, &limits_with_max_event(64)).unwrap();
        assert_eq!(event.message(), message);
    }

    #[test]
    fn test_validate_empty_message() {
        let mut event = LogEvent::new(0, "");
        let err = event.validate(&Limits::default()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyMessage);
        assert_eq!(err.to_string(), "empty log event message");
    }

    #[test]
    fn test_validate_timestamp_out_of_range() {
        let now = 1_000 * DAY_MS;
        let limits = Limits::default();

        let mut month_old = LogEvent::new(now - 30 * DAY_MS, "test");
        assert_eq!(
            month_old.validate_at(now, &limits),
            Err(ValidationError::TimestampOutOfRange)
        );

        let mut just_too_old = LogEvent::new(now - 14 * DAY_MS - 1, "test");
        assert_eq!(
            just_too_old.validate_at(now, &limits),
            Err(ValidationError::TimestampOutOfRange)
        );

        let mut oldest_allowed = LogEvent::new(now - 14 * DAY_MS, "test");
        assert!(oldest_allowed.validate_at(now, &limits).is_ok());

        let mut newest_allowed = LogEvent::new(now + 2 * HOUR_MS, "test");
        assert!(newest_allowed.validate_at(now, &limits).is_ok());

        let mut too_new = LogEvent::new(now + 2 * HOUR_MS + 1, "test");
        let err = too_new.validate_at(now, &limits).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the log entry's timestamp is older than 14 days or more than 2 hours in the future"
        );
    }

    #[test]
    fn test_validate_uses_configured_age_window() {
        let limits = Limits {
            max_event_age: Duration::from_secs(60),
            ..Limits::default()
        };
        let now = 1_000 * DAY_MS;
        let mut event = LogEvent::new(now - 61_000, "test");
        assert_eq!(
            event.validate_at(now, &limits),
            Err(ValidationError::TimestampOutOfRange)
        );
    }

    #[test]
    fn test_serialize_input_event_shape() {
        let event = LogEvent::new(1_700_000_000_000, "hello");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"timestamp":1700000000000,"message":"hello"}"#);
    }
}
