// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::error::Error as StdError;

use crossbeam_channel::Sender;
use rowtap_core::ChangeEvent;
use tracing::info;

pub type HandlerResult = Result<(), Box<dyn StdError + Send + Sync>>;

/// Receives the change events of every fetched batch.
///
/// `resolve` is called at most once per batch with all qualifying events of
/// that batch, in source order. Returning an error (or panicking) marks the
/// batch as failed, see [`AckPolicy`] for what happens next.
///
/// [`AckPolicy`]: rowtap_core::AckPolicy
pub trait Handler: Send + 'static {
	fn resolve(&mut self, events: Vec<ChangeEvent>) -> HandlerResult;
}

impl<F> Handler for F
where
	F: FnMut(Vec<ChangeEvent>) -> HandlerResult + Send + 'static,
{
	fn resolve(&mut self, events: Vec<ChangeEvent>) -> HandlerResult {
		self(events)
	}
}

/// Logs every event list as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl Handler for LoggingHandler {
	fn resolve(&mut self, events: Vec<ChangeEvent>) -> HandlerResult {
		let json = serde_json::to_string(&events)?;
		info!(count = events.len(), "received change events: {}", json);
		Ok(())
	}
}

/// Forwards every event list into a channel.
///
/// Fails once the receiving side is gone.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
	sender: Sender<Vec<ChangeEvent>>,
}

impl ChannelHandler {
	pub fn new(sender: Sender<Vec<ChangeEvent>>) -> Self {
		Self {
			sender,
		}
	}
}

impl Handler for ChannelHandler {
	fn resolve(&mut self, events: Vec<ChangeEvent>) -> HandlerResult {
		self.sender.send(events).map_err(|_| "change event receiver disconnected")?;
		Ok(())
	}
}
