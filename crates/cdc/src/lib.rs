// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Change data capture consumer.
//!
//! A [`PollConsumer`] owns a [`Connector`] to a replication log source and a
//! user supplied [`Handler`]. Once started, a single worker thread fetches
//! batches, turns row level entries into [`ChangeEvent`]s, hands them to the
//! handler and acknowledges the batch.
//!
//! [`ChangeEvent`]: rowtap_core::ChangeEvent

pub mod connector;
pub mod consume;

pub use connector::Connector;
pub use consume::{
	BatchOutcome, BatchProcessor, CdcConsumer, ChannelHandler, ConsumerState, ConsumerStats, Disposition,
	Handler, HandlerResult, Lifecycle, LoggingHandler, PollConsumer, transform,
};
