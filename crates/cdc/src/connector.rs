// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rowtap_core::{Batch, BatchId, Result};

/// Session to a replication log source.
///
/// A connector is owned by exactly one worker thread once the consumer is
/// started, so none of the methods need to be thread safe.
pub trait Connector: Send + 'static {
	/// Establish the session. Failure is fatal to the consumer.
	fn connect(&mut self) -> Result<()>;

	/// Restrict the stream to tables matching `filter`.
	fn subscribe(&mut self, filter: &str) -> Result<()>;

	/// Discard everything handed out but not acknowledged and resume from the
	/// last acknowledged position.
	fn rollback(&mut self) -> Result<()>;

	/// Fetch up to `max_size` entries without advancing the acknowledged
	/// position. Returns [`Batch::empty`] when nothing new is available.
	fn fetch(&mut self, max_size: usize) -> Result<Batch>;

	/// Confirm that every entry up to and including `batch_id` was processed.
	fn ack(&mut self, batch_id: BatchId) -> Result<()>;

	fn disconnect(&mut self) -> Result<()>;
}

impl<C: Connector + ?Sized> Connector for Box<C> {
	fn connect(&mut self) -> Result<()> {
		(**self).connect()
	}

	fn subscribe(&mut self, filter: &str) -> Result<()> {
		(**self).subscribe(filter)
	}

	fn rollback(&mut self) -> Result<()> {
		(**self).rollback()
	}

	fn fetch(&mut self, max_size: usize) -> Result<Batch> {
		(**self).fetch(max_size)
	}

	fn ack(&mut self, batch_id: BatchId) -> Result<()> {
		(**self).ack(batch_id)
	}

	fn disconnect(&mut self) -> Result<()> {
		(**self).disconnect()
	}
}
