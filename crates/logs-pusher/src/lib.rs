// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batches log events from many producers into requests that respect the
//! limits of an append-only log ingestion API (`PutLogEvents`), and sends
//! them in timestamp order, one stream at a time.
//!
//! - [`log_event`]: validation and truncation of single events
//! - [`batch`]: size, count and time window bounded batches
//! - [`pusher`]: the concurrency-safe front end and the sending task
//! - [`client`]: the transport the batches are handed to

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]
#![deny(unreachable_pub)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod client;
pub mod config;
pub mod constants;
pub mod errors;
pub mod log_event;
pub mod pusher;

pub use batch::LogEventBatch;
pub use client::{ClientError, LogClient, PutLogEventsInput};
pub use config::{Limits, PusherConfig};
pub use errors::{ConfigError, PushError, ValidationError};
pub use log_event::LogEvent;
pub use pusher::{PushService, Pusher};
