// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::atomic::{AtomicU64, Ordering};

/// Point in time copy of the worker counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsumerStats {
	/// Non-empty batches fetched
	pub batches: u64,
	/// Change events handed to the handler
	pub events: u64,
	pub acked: u64,
	pub rolled_back: u64,
	/// Batches that failed to parse or whose handler failed
	pub failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Stats {
	batches: AtomicU64,
	events: AtomicU64,
	acked: AtomicU64,
	rolled_back: AtomicU64,
	failures: AtomicU64,
}

impl Stats {
	pub(crate) fn record_batch(&self) {
		self.batches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_events(&self, count: usize) {
		self.events.fetch_add(count as u64, Ordering::Relaxed);
	}

	pub(crate) fn record_ack(&self) {
		self.acked.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rollback(&self) {
		self.rolled_back.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> ConsumerStats {
		ConsumerStats {
			batches: self.batches.load(Ordering::Relaxed),
			events: self.events.load(Ordering::Relaxed),
			acked: self.acked.load(Ordering::Relaxed),
			rolled_back: self.rolled_back.load(Ordering::Relaxed),
			failures: self.failures.load(Ordering::Relaxed),
		}
	}
}
