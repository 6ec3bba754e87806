// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use rowtap_cdc::Connector;
use rowtap_core::{Batch, BatchId, Entry, Error, Result};

use crate::{Call, CallLog};

const ADDRESS: &str = "mock:0";

#[derive(Debug, Default)]
struct Script {
	next_id: i64,
	pending: VecDeque<Batch>,
	outstanding: Vec<Batch>,
	connect_error: Option<String>,
	fetch_errors: usize,
	ack_errors: usize,
}

impl Script {
	fn push(&mut self, entries: Vec<Entry>) -> BatchId {
		self.next_id += 1;
		let id = BatchId(self.next_id);
		self.pending.push_back(Batch::new(id, entries));
		id
	}
}

/// Feeds further batches into a [`MockConnector`] that is already owned by a
/// consumer.
#[derive(Debug, Clone)]
pub struct Feed {
	script: Arc<Mutex<Script>>,
}

impl Feed {
	pub fn push(&self, entries: Vec<Entry>) -> BatchId {
		self.script.lock().push(entries)
	}

	/// Batches fetched but neither acked nor rolled back yet.
	pub fn outstanding(&self) -> Vec<BatchId> {
		self.script.lock().outstanding.iter().map(|b| b.id).collect()
	}

	pub fn pending(&self) -> usize {
		self.script.lock().pending.len()
	}
}

/// Scripted connector.
///
/// Hands out the queued batches in order, one per fetch, and an empty batch
/// once the queue is drained. Ack settles every outstanding batch up to the
/// acked id, rollback puts the outstanding batches back in front of the queue.
#[derive(Debug)]
pub struct MockConnector {
	log: CallLog,
	script: Arc<Mutex<Script>>,
}

impl MockConnector {
	pub fn new(log: CallLog) -> Self {
		Self {
			log,
			script: Arc::new(Mutex::new(Script::default())),
		}
	}

	pub fn with_batch(self, entries: Vec<Entry>) -> Self {
		self.script.lock().push(entries);
		self
	}

	pub fn failing_connect(self, reason: impl Into<String>) -> Self {
		self.script.lock().connect_error = Some(reason.into());
		self
	}

	/// The next `count` fetches fail.
	pub fn failing_fetches(self, count: usize) -> Self {
		self.script.lock().fetch_errors = count;
		self
	}

	/// The next `count` acks fail.
	pub fn failing_acks(self, count: usize) -> Self {
		self.script.lock().ack_errors = count;
		self
	}

	pub fn feed(&self) -> Feed {
		Feed {
			script: Arc::clone(&self.script),
		}
	}
}

impl Connector for MockConnector {
	fn connect(&mut self) -> Result<()> {
		self.log.record(Call::Connect);
		match &self.script.lock().connect_error {
			Some(reason) => Err(Error::connection(ADDRESS, reason)),
			None => Ok(()),
		}
	}

	fn subscribe(&mut self, filter: &str) -> Result<()> {
		self.log.record(Call::Subscribe(filter.to_string()));
		Ok(())
	}

	fn rollback(&mut self) -> Result<()> {
		self.log.record(Call::Rollback);
		let mut script = self.script.lock();
		let outstanding = std::mem::take(&mut script.outstanding);
		for batch in outstanding.into_iter().rev() {
			script.pending.push_front(batch);
		}
		Ok(())
	}

	fn fetch(&mut self, max_size: usize) -> Result<Batch> {
		self.log.record(Call::Fetch(max_size));
		let mut script = self.script.lock();

		if script.fetch_errors > 0 {
			script.fetch_errors -= 1;
			return Err(Error::connection(ADDRESS, "connection reset"));
		}

		match script.pending.pop_front() {
			Some(batch) => {
				script.outstanding.push(batch.clone());
				Ok(batch)
			}
			None => Ok(Batch::empty()),
		}
	}

	fn ack(&mut self, batch_id: BatchId) -> Result<()> {
		self.log.record(Call::Ack(batch_id));
		let mut script = self.script.lock();

		if script.ack_errors > 0 {
			script.ack_errors -= 1;
			return Err(Error::connection(ADDRESS, "ack rejected"));
		}

		if !script.outstanding.iter().any(|b| b.id == batch_id) {
			return Err(Error::UnknownBatch(batch_id));
		}
		script.outstanding.retain(|b| b.id > batch_id);
		Ok(())
	}

	fn disconnect(&mut self) -> Result<()> {
		self.log.record(Call::Disconnect);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fixture;

	#[test]
	fn test_drained_queue_yields_empty_batches() {
		let mut connector = MockConnector::new(CallLog::new()).with_batch(vec![fixture::insert_user(1, "alice")]);

		assert_eq!(connector.fetch(10).unwrap().id, 1);
		assert!(connector.fetch(10).unwrap().is_empty());
		assert!(connector.fetch(10).unwrap().is_empty());
	}

	#[test]
	fn test_rollback_redelivers() {
		let mut connector = MockConnector::new(CallLog::new())
			.with_batch(vec![fixture::insert_user(1, "alice")])
			.with_batch(vec![fixture::insert_user(2, "bob")]);

		assert_eq!(connector.fetch(10).unwrap().id, 1);
		connector.rollback().unwrap();
		assert_eq!(connector.fetch(10).unwrap().id, 1);
		connector.ack(BatchId(1)).unwrap();
		assert_eq!(connector.fetch(10).unwrap().id, 2);
	}

	#[test]
	fn test_ack_unknown_batch() {
		let mut connector = MockConnector::new(CallLog::new());
		assert!(matches!(connector.ack(BatchId(3)), Err(Error::UnknownBatch(BatchId(3)))));
	}

	#[test]
	fn test_feed_pushes_into_running_connector() {
		let mut connector = MockConnector::new(CallLog::new());
		let feed = connector.feed();

		assert!(connector.fetch(1).unwrap().is_empty());
		feed.push(vec![fixture::delete_user(1, "alice")]);
		assert_eq!(feed.pending(), 1);
		assert_eq!(connector.fetch(1).unwrap().len(), 1);
		assert_eq!(feed.pending(), 0);
		assert_eq!(feed.outstanding(), vec![BatchId(1)]);
	}
}
