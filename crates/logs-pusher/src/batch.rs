// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Accumulation of log events into a single `PutLogEvents` request.
//!
//! A batch is sealed once the next event would break one of the request
//! limits:
//! 1. **Size limit**: summed event payload bytes
//! 2. **Count limit**: number of events
//! 3. **Time window**: events of one request may not span more than 24 hours
//!
//! Events are kept in insertion order and only sorted right before the
//! request is built, since the service rejects out-of-order events.

use crate::client::PutLogEventsInput;
use crate::config::Limits;
use crate::log_event::{duration_ms, LogEvent};

#[derive(Debug, Clone)]
pub struct LogEventBatch {
    log_group_name: String,
    log_stream_name: String,
    events: Vec<LogEvent>,
    /// Smallest event timestamp, 0 until the first append
    min_timestamp_ms: i64,
    /// Largest event timestamp, 0 until the first append
    max_timestamp_ms: i64,
    byte_total: usize,
    sequence_token: Option<String>,
    limits: Limits,
}

impl LogEventBatch {
    /// Creates an empty batch with room for `limits.max_events_per_batch` events.
    #[must_use]
    pub fn new(
        log_group_name: impl Into<String>,
        log_stream_name: impl Into<String>,
        limits: Limits,
    ) -> Self {
        LogEventBatch {
            log_group_name: log_group_name.into(),
            log_stream_name: log_stream_name.into(),
            events: Vec::with_capacity(limits.max_events_per_batch),
            min_timestamp_ms: 0,
            max_timestamp_ms: 0,
            byte_total: 0,
            sequence_token: None,
            limits,
        }
    }

    #[must_use]
    pub fn log_group_name(&self) -> &str {
        &self.log_group_name
    }

    #[must_use]
    pub fn log_stream_name(&self) -> &str {
        &self.log_stream_name
    }

    #[must_use]
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn byte_total(&self) -> usize {
        self.byte_total
    }

    #[must_use]
    pub fn min_timestamp_ms(&self) -> i64 {
        self.min_timestamp_ms
    }

    #[must_use]
    pub fn max_timestamp_ms(&self) -> i64 {
        self.max_timestamp_ms
    }

    #[must_use]
    pub fn sequence_token(&self) -> Option<&str> {
        self.sequence_token.as_deref()
    }

    pub fn set_sequence_token(&mut self, sequence_token: Option<String>) {
        self.sequence_token = sequence_token;
    }

    /// Whether an event at `timestamp_ms` keeps the batch within the allowed
    /// time span. An empty batch accepts any timestamp.
    #[must_use]
    pub fn is_active(&self, timestamp_ms: i64) -> bool {
        if self.events.is_empty() {
            return true;
        }
        let max_span_ms = duration_ms(self.limits.max_batch_span);
        if timestamp_ms.saturating_sub(self.min_timestamp_ms) > max_span_ms {
            return false;
        }
        if self.max_timestamp_ms.saturating_sub(timestamp_ms) > max_span_ms {
            return false;
        }
        true
    }

    /// Whether `event` can be appended without breaking any request limit.
    #[must_use]
    pub fn can_accept(&self, event: &LogEvent) -> bool {
        self.byte_total + event.payload_bytes() <= self.limits.max_request_payload_bytes
            && self.events.len() < self.limits.max_events_per_batch
            && self.events.len() < self.events.capacity()
            && self.is_active(event.timestamp_ms())
    }

    /// Adds `event` and updates the byte total and timestamp bounds.
    ///
    /// Callers check [`LogEventBatch::can_accept`] first.
    pub fn append(&mut self, event: LogEvent) {
        let timestamp_ms = event.timestamp_ms();
        if self.events.is_empty() {
            self.min_timestamp_ms = timestamp_ms;
            self.max_timestamp_ms = timestamp_ms;
        } else {
            self.min_timestamp_ms = self.min_timestamp_ms.min(timestamp_ms);
            self.max_timestamp_ms = self.max_timestamp_ms.max(timestamp_ms);
        }
        self.byte_total += event.payload_bytes();
        self.events.push(event);
    }

    /// Stable sort by timestamp, events with equal timestamps keep their
    /// insertion order.
    pub fn sort_log_events(&mut self) {
        self.events.sort_by_key(LogEvent::timestamp_ms);
    }

    #[must_use]
    pub fn into_input(self) -> PutLogEventsInput {
        PutLogEventsInput {
            log_group_name: self.log_group_name,
            log_stream_name: self.log_stream_name,
            sequence_token: self.sequence_token,
            log_events: self.events,
        }
    }
}
