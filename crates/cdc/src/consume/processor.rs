// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	any::Any,
	panic::{AssertUnwindSafe, catch_unwind},
	sync::Arc,
};

use rowtap_core::{AckPolicy, Batch, BatchId, ChangeEvent, Entry, Error, Result, RowChange};
use tracing::{debug, error, trace, warn};

use super::{Handler, stats::Stats};
use crate::Connector;

/// Turns raw entries into change events.
///
/// Entries that are not row data and payloads whose event type is not an
/// insert, update or delete are skipped. A payload that cannot be decoded
/// fails the whole batch.
pub fn transform(entries: &[Entry]) -> Result<Vec<ChangeEvent>> {
	let mut events = Vec::with_capacity(entries.len());

	for (index, entry) in entries.iter().enumerate() {
		if !entry.is_row_data() {
			continue;
		}

		let change = RowChange::decode(&entry.payload).map_err(|e| Error::Parse {
			index,
			table: entry.qualified_name(),
			reason: e.to_string(),
		})?;

		let Some(event_type) = change.event_type.as_event_type() else {
			trace!(table = %entry.qualified_name(), "skipping {:?} entry", change.event_type);
			continue;
		};

		events.push(ChangeEvent::project(&entry.header, event_type, &change.rows));
	}

	Ok(events)
}

/// What became of a batch's business processing.
#[derive(Debug)]
pub enum BatchOutcome {
	/// The handler accepted the events
	Handled {
		events: usize,
	},
	/// Nothing in the batch qualified, the handler was not called
	Skipped,
	ParseFailed(Error),
	HandlerFailed(Error),
}

impl BatchOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, BatchOutcome::Handled { .. } | BatchOutcome::Skipped)
	}
}

/// What was done with the batch at the source afterwards.
#[derive(Debug)]
pub enum Disposition {
	Acked(BatchOutcome),
	RolledBack(BatchOutcome),
	/// Ack or rollback itself failed
	Unsettled(BatchOutcome, Error),
}

impl Disposition {
	pub fn outcome(&self) -> &BatchOutcome {
		match self {
			Disposition::Acked(outcome) | Disposition::RolledBack(outcome) | Disposition::Unsettled(outcome, _) => {
				outcome
			}
		}
	}

	pub fn is_acked(&self) -> bool {
		matches!(self, Disposition::Acked(_))
	}
}

/// Processes one batch at a time: transform, hand off, settle.
pub struct BatchProcessor<H: Handler> {
	handler: H,
	ack_policy: AckPolicy,
	stats: Arc<Stats>,
}

impl<H: Handler> BatchProcessor<H> {
	pub fn new(handler: H, ack_policy: AckPolicy) -> Self {
		Self::with_stats(handler, ack_policy, Arc::new(Stats::default()))
	}

	pub(crate) fn with_stats(handler: H, ack_policy: AckPolicy, stats: Arc<Stats>) -> Self {
		Self {
			handler,
			ack_policy,
			stats,
		}
	}

	/// Handles `batch` and then acks it or rolls the connector back,
	/// depending on the ack policy and the outcome. The handler has always
	/// returned before the connector is touched.
	pub fn process<C: Connector + ?Sized>(&mut self, connector: &mut C, batch: Batch) -> Disposition {
		let batch_id = batch.id;
		self.stats.record_batch();

		let outcome = self.handle(batch_id, &batch.entries);
		if !outcome.is_success() {
			self.stats.record_failure();
		}

		if outcome.is_success() || self.ack_policy == AckPolicy::Always {
			match connector.ack(batch_id) {
				Ok(()) => {
					self.stats.record_ack();
					trace!(batch_id = %batch_id, "acknowledged batch");
					Disposition::Acked(outcome)
				}
				Err(err) => {
					error!(batch_id = %batch_id, code = err.code(), "failed to acknowledge batch: {}", err);
					Disposition::Unsettled(outcome, err)
				}
			}
		} else {
			warn!(batch_id = %batch_id, "rolling back failed batch for redelivery");
			match connector.rollback() {
				Ok(()) => {
					self.stats.record_rollback();
					Disposition::RolledBack(outcome)
				}
				Err(err) => {
					error!(batch_id = %batch_id, code = err.code(), "failed to roll back batch: {}", err);
					Disposition::Unsettled(outcome, err)
				}
			}
		}
	}

	fn handle(&mut self, batch_id: BatchId, entries: &[Entry]) -> BatchOutcome {
		let events = match transform(entries) {
			Ok(events) => events,
			Err(err) => {
				error!(batch_id = %batch_id, code = err.code(), "failed to parse batch: {}", err);
				return BatchOutcome::ParseFailed(err);
			}
		};

		if events.is_empty() {
			trace!(batch_id = %batch_id, entries = entries.len(), "no row changes in batch");
			return BatchOutcome::Skipped;
		}

		let count = events.len();
		debug!(batch_id = %batch_id, events = count, "handing over change events");

		let handler = &mut self.handler;
		let result = catch_unwind(AssertUnwindSafe(|| handler.resolve(events)));

		let err = match result {
			Ok(Ok(())) => {
				self.stats.record_events(count);
				return BatchOutcome::Handled {
					events: count,
				};
			}
			Ok(Err(err)) => Error::Handler(err.to_string()),
			Err(panic) => Error::Handler(format!("handler panicked: {}", panic_message(&*panic))),
		};

		error!(batch_id = %batch_id, code = err.code(), "change event handler failed: {}", err);
		BatchOutcome::HandlerFailed(err)
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
	if let Some(s) = panic.downcast_ref::<&str>() {
		s
	} else if let Some(s) = panic.downcast_ref::<String>() {
		s
	} else {
		"unknown panic"
	}
}
