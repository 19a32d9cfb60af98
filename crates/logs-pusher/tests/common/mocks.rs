// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-ins for the log ingestion service

use async_trait::async_trait;
use logs_pusher::{ClientError, LogClient, PutLogEventsInput};
use std::collections::HashSet;
use std::sync::Mutex;

/// Accepts every request and remembers every event message it saw
#[derive(Default)]
pub struct AlwaysPassMockLogClient {
    requests: Mutex<Vec<PutLogEventsInput>>,
}

#[allow(dead_code)]
impl AlwaysPassMockLogClient {
    pub fn requests(&self) -> Vec<PutLogEventsInput> {
        self.requests.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .flat_map(|request| request.log_events.iter().map(|e| e.message().to_string()))
            .collect()
    }

    /// Messages seen more than once, in arrival order
    pub fn duplicates(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.messages()
            .into_iter()
            .filter(|message| !seen.insert(message.clone()))
            .collect()
    }
}

#[async_trait]
impl LogClient for AlwaysPassMockLogClient {
    async fn create_stream(
        &self,
        _log_group_name: &str,
        _log_stream_name: &str,
    ) -> Result<Option<String>, ClientError> {
        Ok(None)
    }

    async fn put_log_events(
        &self,
        input: PutLogEventsInput,
    ) -> Result<Option<String>, ClientError> {
        let mut requests = self.requests.lock().unwrap();
        let token = input
            .sequence_token
            .as_deref()
            .map_or(1, |token| token.parse::<u64>().unwrap_or(0) + 1);
        requests.push(input);
        Ok(Some(token.to_string()))
    }
}
