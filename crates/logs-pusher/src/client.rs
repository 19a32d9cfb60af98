// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::Serialize;

use crate::log_event::LogEvent;

/// Body of a `PutLogEvents` request, built from a sealed and sorted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutLogEventsInput {
    pub log_group_name: String,
    pub log_stream_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_token: Option<String>,
    pub log_events: Vec<LogEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The service refused the request; sending it again will not help
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The request did not complete, possibly after retries
    #[error("transport error: {0}")]
    Transport(String),
}

/// Transport to the log ingestion service.
///
/// Retries and backoff belong to the implementation. The pusher only ever
/// hands over batches that respect the request limits, ordered by timestamp,
/// one request at a time per stream.
#[async_trait]
pub trait LogClient: Send + Sync {
    /// Makes sure the destination stream exists and returns its current
    /// sequence token, if the service reports one.
    async fn create_stream(
        &self,
        log_group_name: &str,
        log_stream_name: &str,
    ) -> Result<Option<String>, ClientError>;

    /// Sends one request and returns the sequence token for the next one.
    async fn put_log_events(&self, input: PutLogEventsInput)
        -> Result<Option<String>, ClientError>;
}
