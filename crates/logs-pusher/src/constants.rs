// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hard limits imposed by the log ingestion API.
//!
//! A `PutLogEvents` request is rejected outright when any of these is
//! violated, so batches are sealed before they can cross one.

use std::time::Duration;

/// Fixed framing cost the service charges on top of each message's bytes.
pub const PER_EVENT_HEADER_BYTES: usize = 26;

/// Default upper bound for a single event, header included (256KB).
pub const DEFAULT_MAX_EVENT_PAYLOAD_BYTES: usize = 256 * 1024;

/// Upper bound for the summed payload of one request (1MB).
pub const MAX_REQUEST_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Upper bound for the number of events in one request.
pub const MAX_REQUEST_EVENT_COUNT: usize = 10_000;

/// Largest allowed span between the oldest and newest event of a request.
/// A span of exactly this long is still accepted.
pub const MAX_BATCH_SPAN: Duration = Duration::from_secs(24 * 60 * 60);

/// Events older than this are refused by the service.
pub const MAX_EVENT_AGE: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Events further than this in the future are refused by the service.
pub const MAX_EVENT_FUTURE_SKEW: Duration = Duration::from_secs(2 * 60 * 60);

/// Appended to a message that had to be shortened to fit the event limit.
pub const TRUNCATED_SUFFIX: &str = "[Truncated...]";

/// The service accepts about 5 requests per second per stream.
pub const DEFAULT_MIN_PUSH_INTERVAL: Duration = Duration::from_millis(200);
