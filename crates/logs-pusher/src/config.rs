// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants;
use crate::errors::ConfigError;

/// Payload limits a batch and its events must respect.
///
/// Production code should use [`Limits::default`], which mirrors the ingestion
/// service. Tests build smaller limits to exercise rotation and truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum bytes of a single event, header included
    pub max_event_payload_bytes: usize,
    /// Maximum summed event bytes of a single request
    pub max_request_payload_bytes: usize,
    /// Maximum number of events of a single request
    pub max_events_per_batch: usize,
    pub max_batch_span: Duration,
    pub max_event_age: Duration,
    pub max_event_future_skew: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_event_payload_bytes: constants::DEFAULT_MAX_EVENT_PAYLOAD_BYTES,
            max_request_payload_bytes: constants::MAX_REQUEST_PAYLOAD_BYTES,
            max_events_per_batch: constants::MAX_REQUEST_EVENT_COUNT,
            max_batch_span: constants::MAX_BATCH_SPAN,
            max_event_age: constants::MAX_EVENT_AGE,
            max_event_future_skew: constants::MAX_EVENT_FUTURE_SKEW,
        }
    }
}

impl Limits {
    /// Smallest event limit that still leaves room for one byte of content
    /// next to the truncation marker.
    #[must_use]
    pub fn min_event_payload_bytes() -> usize {
        constants::PER_EVENT_HEADER_BYTES + constants::TRUNCATED_SUFFIX.len() + 1
    }

    /// Checks that a truncated event always fits the event limit and that a
    /// single event always fits an empty batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_event_payload_bytes < Self::min_event_payload_bytes() {
            return Err(ConfigError::InvalidLimits(
                "max_event_payload_bytes leaves no room for content next to the truncation marker",
            ));
        }
        if self.max_event_payload_bytes > self.max_request_payload_bytes {
            return Err(ConfigError::InvalidLimits(
                "max_event_payload_bytes exceeds max_request_payload_bytes",
            ));
        }
        if self.max_events_per_batch == 0 {
            return Err(ConfigError::InvalidLimits(
                "max_events_per_batch must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PusherConfig {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub limits: Limits,
    /// Minimum time between two requests for the stream
    pub min_push_interval: Duration,
    /// Flush the active batch on this cadence, when set
    pub flush_interval: Option<Duration>,
}

impl Default for PusherConfig {
    fn default() -> Self {
        PusherConfig {
            log_group_name: String::new(),
            log_stream_name: String::new(),
            limits: Limits::default(),
            min_push_interval: constants::DEFAULT_MIN_PUSH_INTERVAL,
            flush_interval: None,
        }
    }
}

impl PusherConfig {
    #[must_use]
    pub fn new(log_group_name: impl Into<String>, log_stream_name: impl Into<String>) -> Self {
        PusherConfig {
            log_group_name: log_group_name.into(),
            log_stream_name: log_stream_name.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from `LOGS_PUSHER_*` environment variables.
    ///
    /// `LOGS_PUSHER_LOG_GROUP` and `LOGS_PUSHER_LOG_STREAM` are required, every
    /// other variable falls back to the service defaults.
    pub fn from_env() -> Result<PusherConfig, ConfigError> {
        let log_group_name = required_var("LOGS_PUSHER_LOG_GROUP")?;
        let log_stream_name = required_var("LOGS_PUSHER_LOG_STREAM")?;

        let mut config = PusherConfig::new(log_group_name, log_stream_name);

        if let Some(max) = parse_var::<usize>("LOGS_PUSHER_MAX_EVENT_PAYLOAD_BYTES")? {
            config.limits.max_event_payload_bytes = max;
        }
        if let Some(ms) = parse_var::<u64>("LOGS_PUSHER_MIN_PUSH_INTERVAL_MS")? {
            config.min_push_interval = Duration::from_millis(ms);
        }
        // 0 disables the periodic flush
        if let Some(secs) = parse_var::<u64>("LOGS_PUSHER_FLUSH_INTERVAL_SECS")? {
            config.flush_interval = (secs > 0).then_some(Duration::from_secs(secs));
        }

        config.limits.validate()?;
        Ok(config)
    }
}

fn required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
