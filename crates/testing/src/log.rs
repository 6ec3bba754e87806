// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{sync::Arc, time::Instant};

use parking_lot::Mutex;
use rowtap_core::BatchId;

/// A call made against a test double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Connect,
	Subscribe(String),
	Rollback,
	Fetch(usize),
	Ack(BatchId),
	Disconnect,
	/// Handler invoked with that many events
	Resolve(usize),
}

/// Time ordered record of calls, shared between the connector and the
/// handler so a test can assert on their interleaving.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
	calls: Arc<Mutex<Vec<(Instant, Call)>>>,
}

impl CallLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&self, call: Call) {
		self.calls.lock().push((Instant::now(), call));
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().iter().map(|(_, call)| call.clone()).collect()
	}

	pub fn timed(&self) -> Vec<(Instant, Call)> {
		self.calls.lock().clone()
	}

	pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
		self.calls.lock().iter().filter(|(_, call)| predicate(call)).count()
	}

	pub fn contains(&self, call: &Call) -> bool {
		self.calls.lock().iter().any(|(_, c)| c == call)
	}

	/// Position of the first recorded `call`.
	pub fn position(&self, call: &Call) -> Option<usize> {
		self.calls.lock().iter().position(|(_, c)| c == call)
	}

	pub fn fetches(&self) -> usize {
		self.count(|call| matches!(call, Call::Fetch(_)))
	}

	pub fn acks(&self) -> Vec<BatchId> {
		self.calls
			.lock()
			.iter()
			.filter_map(|(_, call)| match call {
				Call::Ack(id) => Some(*id),
				_ => None,
			})
			.collect()
	}
}
