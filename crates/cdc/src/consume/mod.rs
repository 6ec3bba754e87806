// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! CDC consumption module
//!
//! This module provides the consumer-side functionality for CDC:
//! - Handler trait and stock handlers receiving change events
//! - Lifecycle state machine guarding start and stop
//! - Batch processing and acknowledgment
//! - Poll-based consumer running the worker loop

mod consumer;
mod handler;
mod lifecycle;
mod poll;
mod processor;
mod stats;

pub use consumer::CdcConsumer;
pub use handler::{ChannelHandler, Handler, HandlerResult, LoggingHandler};
pub use lifecycle::{ConsumerState, Lifecycle};
pub use poll::PollConsumer;
pub use processor::{BatchOutcome, BatchProcessor, Disposition, transform};
pub use stats::ConsumerStats;
