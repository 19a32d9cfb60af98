// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Concurrency-safe batching front end and the task that sends the batches.
//!
//! ```text
//!    ┌──────────────┐
//!    │   Pushers    │ (Clone, any thread)
//!    └──────┬───────┘
//!           │ check / rotate / append under one mutex
//!           v
//!    ┌──────────────┐
//!    │ Active batch │
//!    └──────┬───────┘
//!           │ sealed batches, in seal order
//!           v
//!    ┌──────────────┐
//!    │ PushService  │ (single task, owns the client and sequence token)
//!    └──────┬───────┘
//!           │ sort, stamp token, PutLogEvents
//!           v
//!       LogClient
//! ```
//!
//! A sealed batch is queued while the mutex is still held, so the service sees
//! batches in the order they were sealed. The request itself runs on the
//! service task and never holds the mutex.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! let (service, pusher) = Pusher::new(PusherConfig::new("group", "stream"), client)?;
//! tokio::spawn(service.run());
//!
//! pusher.add_log_entry(LogEvent::new(0, "hello"))?;
//! pusher.force_flush().await?;
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::batch::LogEventBatch;
use crate::client::{ClientError, LogClient};
use crate::config::{Limits, PusherConfig};
use crate::errors::{ConfigError, PushError};
use crate::log_event::LogEvent;

type PushAck = oneshot::Sender<Result<(), ClientError>>;

#[derive(Debug)]
pub(crate) enum PushCommand {
    /// Send a sealed batch, reporting the result on `ack` when present
    Push {
        batch: LogEventBatch,
        ack: Option<PushAck>,
    },
    /// Answered once every command queued before it has been handled
    Sync(oneshot::Sender<()>),
    Shutdown,
}

/// The single batch new events may join.
#[derive(Debug)]
struct ActiveBatch {
    log_group_name: String,
    log_stream_name: String,
    limits: Limits,
    batch: Mutex<LogEventBatch>,
}

impl ActiveBatch {
    fn new(log_group_name: String, log_stream_name: String, limits: Limits) -> Self {
        let batch = LogEventBatch::new(log_group_name.clone(), log_stream_name.clone(), limits);
        ActiveBatch {
            log_group_name,
            log_stream_name,
            limits,
            batch: Mutex::new(batch),
        }
    }

    fn empty_batch(&self) -> LogEventBatch {
        LogEventBatch::new(
            self.log_group_name.clone(),
            self.log_stream_name.clone(),
            self.limits,
        )
    }

    /// Appends `event`, first sealing the batch when it cannot take it.
    fn add(
        &self,
        event: LogEvent,
        tx: &mpsc::UnboundedSender<PushCommand>,
    ) -> Result<(), PushError> {
        #[allow(clippy::expect_used)]
        let mut batch = self.batch.lock().expect("lock poisoned");

        if tx.is_closed() {
            return Err(PushError::ServiceStopped);
        }

        if !batch.is_empty() && !batch.can_accept(&event) {
            let sealed = std::mem::replace(&mut *batch, self.empty_batch());
            debug!(
                "LOGS | Rotating batch with {} events ({} bytes)",
                sealed.len(),
                sealed.byte_total()
            );
            if let Err(mpsc::error::SendError(command)) = tx.send(PushCommand::Push {
                batch: sealed,
                ack: None,
            }) {
                if let PushCommand::Push { batch: sealed, .. } = command {
                    *batch = sealed;
                }
                error!("LOGS | Push service stopped, cannot rotate batch");
                return Err(PushError::ServiceStopped);
            }
        }

        batch.append(event);
        Ok(())
    }

    /// Detaches the batch if it holds anything and queues it for sending.
    ///
    /// Returns whether a batch was queued.
    fn seal(
        &self,
        tx: &mpsc::UnboundedSender<PushCommand>,
        ack: Option<PushAck>,
    ) -> Result<bool, PushError> {
        #[allow(clippy::expect_used)]
        let mut batch = self.batch.lock().expect("lock poisoned");

        if batch.is_empty() {
            return Ok(false);
        }

        let sealed = std::mem::replace(&mut *batch, self.empty_batch());
        if let Err(mpsc::error::SendError(command)) = tx.send(PushCommand::Push {
            batch: sealed,
            ack,
        }) {
            if let PushCommand::Push { batch: sealed, .. } = command {
                *batch = sealed;
            }
            return Err(PushError::ServiceStopped);
        }
        Ok(true)
    }

    /// Detaches whatever is buffered without queueing it.
    fn take(&self) -> LogEventBatch {
        #[allow(clippy::expect_used)]
        let mut batch = self.batch.lock().expect("lock poisoned");
        std::mem::replace(&mut *batch, self.empty_batch())
    }

    fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        self.batch.lock().expect("lock poisoned").len()
    }
}

/// Entry point for producers.
///
/// Cheap to clone, and every clone feeds the same active batch and the same
/// [`PushService`].
#[derive(Clone, Debug)]
pub struct Pusher {
    active: Arc<ActiveBatch>,
    tx: mpsc::UnboundedSender<PushCommand>,
}

impl Pusher {
    /// Creates the pusher and the service that sends its batches.
    ///
    /// The service does nothing until [`PushService::run`] is spawned.
    /// Limits that would let an event or a batch exceed the service limits
    /// are refused.
    pub fn new(
        config: PusherConfig,
        client: Arc<dyn LogClient>,
    ) -> Result<(PushService, Pusher), ConfigError> {
        config.limits.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(ActiveBatch::new(
            config.log_group_name,
            config.log_stream_name,
            config.limits,
        ));

        let service = PushService {
            client,
            active: Arc::clone(&active),
            rx,
            tx: tx.downgrade(),
            sequence_token: None,
            stream_created: false,
            min_push_interval: config.min_push_interval,
            flush_interval: config.flush_interval,
            last_push: None,
        };
        let pusher = Pusher { active, tx };

        Ok((service, pusher))
    }

    #[must_use]
    pub fn log_group_name(&self) -> &str {
        &self.active.log_group_name
    }

    #[must_use]
    pub fn log_stream_name(&self) -> &str {
        &self.active.log_stream_name
    }

    /// Number of events in the active batch.
    #[must_use]
    pub fn buffered_events(&self) -> usize {
        self.active.len()
    }

    /// Validates `event` and adds it to the active batch.
    ///
    /// An invalid event is dropped and logged. The error is returned for the
    /// caller's information only; producers are free to ignore it.
    pub fn add_log_entry(&self, mut event: LogEvent) -> Result<(), PushError> {
        if let Err(err) = event.validate(&self.active.limits) {
            warn!("LOGS | Dropping log event: {err}");
            return Err(err.into());
        }
        self.active.add(event, &self.tx)
    }

    /// Adds an event to the active batch, rotating the batch when the event
    /// does not fit.
    ///
    /// `None` is refused with [`PushError::NilEvent`] and leaves the batch
    /// untouched.
    pub fn add_log_event(&self, event: Option<LogEvent>) -> Result<(), PushError> {
        let Some(mut event) = event else {
            return Err(PushError::NilEvent);
        };
        event.validate(&self.active.limits)?;
        self.active.add(event, &self.tx)
    }

    /// Sends whatever is buffered, even if the batch is not full.
    ///
    /// Events added while the flush is in progress land in the next batch.
    /// With nothing buffered no request is made; the call still waits for
    /// batches sealed earlier to be sent.
    pub async fn force_flush(&self) -> Result<(), PushError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.active.seal(&self.tx, Some(ack_tx))? {
            return match ack_rx.await {
                Ok(result) => result.map_err(PushError::from),
                Err(_) => Err(PushError::ServiceStopped),
            };
        }

        let (sync_tx, sync_rx) = oneshot::channel();
        if self.tx.send(PushCommand::Sync(sync_tx)).is_ok() {
            // the service answers unless it is gone, and then there is nothing to wait for
            let _ = sync_rx.await;
        }
        Ok(())
    }

    /// Flushes, then stops the service once everything queued is sent.
    pub async fn shutdown(&self) -> Result<(), PushError> {
        self.force_flush().await?;
        self.tx
            .send(PushCommand::Shutdown)
            .map_err(|_| PushError::ServiceStopped)
    }
}

/// Sends sealed batches one at a time, in the order they were sealed.
pub struct PushService {
    client: Arc<dyn LogClient>,
    active: Arc<ActiveBatch>,
    rx: mpsc::UnboundedReceiver<PushCommand>,
    tx: mpsc::WeakUnboundedSender<PushCommand>,
    sequence_token: Option<String>,
    stream_created: bool,
    min_push_interval: Duration,
    flush_interval: Option<Duration>,
    last_push: Option<Instant>,
}

impl PushService {
    /// Runs until [`Pusher::shutdown`] is called or every [`Pusher`] is dropped.
    ///
    /// Whatever is still buffered at that point is sent before returning.
    pub async fn run(mut self) {
        debug!(
            "LOGS | Push service started for {}/{}",
            self.active.log_group_name, self.active.log_stream_name
        );

        let mut ticker = self.flush_interval.map(|period| {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let command = match ticker.as_mut() {
                Some(ticker) => tokio::select! {
                    command = self.rx.recv() => command,
                    _ = ticker.tick() => {
                        self.flush_on_tick();
                        continue;
                    }
                },
                None => self.rx.recv().await,
            };

            match command {
                Some(PushCommand::Push { batch, ack }) => {
                    let result = self.push(batch).await;
                    if let Some(ack) = ack {
                        if ack.send(result).is_err() {
                            debug!("LOGS | Flush caller went away before the push completed");
                        }
                    }
                }
                Some(PushCommand::Sync(done)) => {
                    let _ = done.send(());
                }
                // refuse new batches but still send the ones already queued
                Some(PushCommand::Shutdown) => self.rx.close(),
                None => break,
            }
        }

        let remaining = self.active.take();
        if !remaining.is_empty() {
            // result already logged by push
            let _ = self.push(remaining).await;
        }
        debug!(
            "LOGS | Push service for {}/{} stopped",
            self.active.log_group_name, self.active.log_stream_name
        );
    }

    fn flush_on_tick(&self) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        if let Err(err) = self.active.seal(&tx, None) {
            debug!("LOGS | Periodic flush skipped: {err}");
        }
    }

    /// Sorts the batch, stamps the stream's sequence token and sends it.
    ///
    /// A failed batch is dropped; retrying is the client's job.
    async fn push(&mut self, mut batch: LogEventBatch) -> Result<(), ClientError> {
        if batch.is_empty() {
            return Ok(());
        }

        if let Some(last_push) = self.last_push {
            let elapsed = last_push.elapsed();
            if elapsed < self.min_push_interval {
                time::sleep(self.min_push_interval - elapsed).await;
            }
        }

        if !self.stream_created && self.sequence_token.is_none() {
            match self
                .client
                .create_stream(&self.active.log_group_name, &self.active.log_stream_name)
                .await
            {
                Ok(token) => {
                    self.stream_created = true;
                    if token.is_some() {
                        self.sequence_token = token;
                    }
                }
                Err(err) => error!(
                    "LOGS | Failed to create log stream {}/{}: {err}",
                    self.active.log_group_name, self.active.log_stream_name
                ),
            }
        }

        batch.sort_log_events();
        batch.set_sequence_token(self.sequence_token.clone());

        let events = batch.len();
        let bytes = batch.byte_total();
        let start = Instant::now();
        let result = self.client.put_log_events(batch.into_input()).await;
        self.last_push = Some(Instant::now());

        match result {
            Ok(token) => {
                if token.is_some() {
                    self.sequence_token = token;
                }
                debug!(
                    "LOGS | Pushed {events} log events ({bytes} bytes) in {} ms",
                    start.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "LOGS | Dropping {events} log events for {}/{}: {err}",
                    self.active.log_group_name, self.active.log_stream_name
                );
                Err(err)
            }
        }
    }
}
