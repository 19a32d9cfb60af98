// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::client::ClientError;

/// Reasons a log event is refused before it reaches a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("empty log event message")]
    EmptyMessage,

    #[error(
        "the log entry's timestamp is older than 14 days or more than 2 hours in the future"
    )]
    TimestampOutOfRange,
}

/// Errors returned by [`crate::pusher::Pusher`] operations
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("no log event to add")]
    NilEvent,

    #[error("log event dropped: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to push log events: {0}")]
    Send(#[from] ClientError),

    #[error("push service is not running")]
    ServiceStopped,
}

/// Errors raised while loading a [`crate::config::PusherConfig`]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid limits: {0}")]
    InvalidLimits(&'static str),
}
