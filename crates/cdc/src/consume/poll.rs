// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	io,
	ops::{Deref, DerefMut},
	sync::Arc,
	thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use parking_lot::Mutex;
use rowtap_core::{ConsumerConfig, Error, Result};
use tracing::{debug, error, info, trace, warn};

use super::{
	BatchProcessor, CdcConsumer, ConsumerState, ConsumerStats, Handler, Lifecycle, stats::Stats,
};
use crate::Connector;

/// Long-poll consumer running one worker thread.
///
/// The worker connects, subscribes and rolls back to the last acknowledged
/// position, then loops: fetch a batch, sleep for the configured backoff if it
/// is empty, otherwise process and settle it. The connector is disconnected
/// whenever the worker exits.
pub struct PollConsumer<C: Connector, H: Handler> {
	config: ConsumerConfig,
	lifecycle: Arc<Lifecycle>,
	stats: Arc<Stats>,
	parts: Mutex<Option<(C, H, Receiver<()>)>>,
	cancel: Mutex<Option<Sender<()>>>,
	worker: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl<C: Connector, H: Handler> PollConsumer<C, H> {
	pub fn new(config: ConsumerConfig, connector: C, handler: H) -> Self {
		// nothing is ever sent, dropping the sender is the cancellation signal
		let (cancel, cancelled) = bounded(0);

		Self {
			config,
			lifecycle: Arc::new(Lifecycle::new()),
			stats: Arc::new(Stats::default()),
			parts: Mutex::new(Some((connector, handler, cancelled))),
			cancel: Mutex::new(Some(cancel)),
			worker: Mutex::new(None),
		}
	}

	pub fn config(&self) -> &ConsumerConfig {
		&self.config
	}

	pub fn stats(&self) -> ConsumerStats {
		self.stats.snapshot()
	}

	/// Blocks until the worker thread has exited and returns its outcome,
	/// the fatal startup error if there was one.
	///
	/// Returns immediately if the consumer was never started or was already
	/// joined.
	pub fn join(&self) -> Result<()> {
		let Some(handle) = self.worker.lock().take() else {
			return Ok(());
		};
		handle.join().unwrap_or_else(|_| Err(Error::Io(io::Error::other("consumer worker panicked"))))
	}

	fn spawn(&self) -> Result<()> {
		let Some((connector, handler, cancelled)) = self.parts.lock().take() else {
			return Ok(());
		};

		let worker = Worker {
			config: self.config.clone(),
			lifecycle: Arc::clone(&self.lifecycle),
			processor: BatchProcessor::with_stats(handler, self.config.ack_policy, Arc::clone(&self.stats)),
			cancelled,
			interrupted: false,
		};

		let handle = thread::Builder::new()
			.name(format!("cdc-{}", self.config.source.destination))
			.spawn(move || worker.run(connector))
			.map_err(|e| {
				self.lifecycle.try_stop();
				Error::Spawn(e)
			})?;

		*self.worker.lock() = Some(handle);
		Ok(())
	}
}

impl<C: Connector, H: Handler> CdcConsumer for PollConsumer<C, H> {
	fn start(&self) -> Result<()> {
		if self.lifecycle.is_running() {
			info!("consumer is already running");
			return Ok(());
		}

		self.config.validate()?;

		if !self.lifecycle.try_start() {
			if self.lifecycle.state() == ConsumerState::Stopped {
				warn!("consumer is stopped and cannot be started again");
			}
			return Ok(());
		}

		info!(
			source = %self.config.source.address(),
			destination = %self.config.source.destination,
			"starting consumer"
		);
		self.spawn()
	}

	fn stop(&self) {
		if self.lifecycle.state() == ConsumerState::Stopped {
			info!("consumer is already stopped");
			return;
		}

		if self.lifecycle.try_stop() {
			info!(destination = %self.config.source.destination, "stopping consumer");
			self.cancel.lock().take();
		}
	}

	fn state(&self) -> ConsumerState {
		self.lifecycle.state()
	}
}

impl<C: Connector, H: Handler> Drop for PollConsumer<C, H> {
	fn drop(&mut self) {
		self.stop();
		let _ = self.join();
	}
}

struct Worker<H: Handler> {
	config: ConsumerConfig,
	lifecycle: Arc<Lifecycle>,
	processor: BatchProcessor<H>,
	cancelled: Receiver<()>,
	interrupted: bool,
}

impl<H: Handler> Worker<H> {
	fn run<C: Connector>(mut self, connector: C) -> Result<()> {
		let mut session = Session(connector);

		if let Err(err) = self.open(&mut session) {
			error!(code = err.code(), "consumer failed to start: {}", err);
			self.lifecycle.try_stop();
			return Err(err);
		}

		let exit = self.poll(&mut session);
		drop(session);

		match exit {
			Exit::Cancelled => info!("consumer worker was cancelled, exiting"),
			Exit::Stopped => info!("consumer is stopped, exiting"),
		}
		Ok(())
	}

	fn open<C: Connector>(&self, session: &mut Session<C>) -> Result<()> {
		debug!(address = %self.config.source.address(), "connecting");
		session.connect()?;
		debug!(filter = %self.config.filter, "subscribing");
		session.subscribe(&self.config.filter)?;
		session.rollback()?;
		debug!(
			"[Consumer {}] Started polling, max batch size {}, backoff {:?}",
			self.config.source.destination, self.config.max_batch_size, self.config.backoff
		);
		Ok(())
	}

	fn poll<C: Connector>(&mut self, session: &mut Session<C>) -> Exit {
		while !self.is_interrupted() && self.lifecycle.is_running() {
			let batch = match session.fetch(self.config.max_batch_size) {
				Ok(batch) => batch,
				Err(err) => {
					error!(code = err.code(), "failed to fetch batch: {}", err);
					self.backoff();
					continue;
				}
			};

			if batch.is_empty() {
				trace!("nothing to fetch, backing off for {:?}", self.config.backoff);
				self.backoff();
				continue;
			}

			if !self.processor.process(&mut **session, batch).is_acked() {
				self.backoff();
			}
		}

		// stop() flips the state before it cancels, look again
		if self.is_interrupted() {
			Exit::Cancelled
		} else {
			Exit::Stopped
		}
	}

	/// Sleeps for the backoff interval, returns early once cancelled.
	fn backoff(&mut self) {
		match self.cancelled.recv_timeout(self.config.backoff) {
			Err(RecvTimeoutError::Disconnected) => self.interrupted = true,
			Ok(()) | Err(RecvTimeoutError::Timeout) => {}
		}
	}

	fn is_interrupted(&mut self) -> bool {
		if !self.interrupted {
			self.interrupted = matches!(self.cancelled.try_recv(), Err(TryRecvError::Disconnected));
		}
		self.interrupted
	}
}

/// What ended the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
	Cancelled,
	Stopped,
}

/// Connector that is disconnected when it goes out of scope.
struct Session<C: Connector>(C);

impl<C: Connector> Deref for Session<C> {
	type Target = C;

	fn deref(&self) -> &C {
		&self.0
	}
}

impl<C: Connector> DerefMut for Session<C> {
	fn deref_mut(&mut self) -> &mut C {
		&mut self.0
	}
}

impl<C: Connector> Drop for Session<C> {
	fn drop(&mut self) {
		match self.0.disconnect() {
			Ok(()) => debug!("disconnected"),
			Err(err) => warn!(code = err.code(), "failed to disconnect: {}", err),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::{Duration, Instant};

	use rowtap_core::{AckPolicy, Batch, BatchId, Entry, EntryKind};

	use super::*;
	use crate::{LoggingHandler, connector::fake::FakeConnector};

	fn worker(backoff: Duration) -> (Worker<LoggingHandler>, Sender<()>) {
		let (cancel, cancelled) = bounded::<()>(0);
		let worker = Worker {
			config: ConsumerConfig::default().with_backoff(backoff),
			lifecycle: Arc::new(Lifecycle::new()),
			processor: BatchProcessor::new(LoggingHandler, AckPolicy::Always),
			cancelled,
			interrupted: false,
		};
		(worker, cancel)
	}

	#[test]
	fn test_backoff_returns_early_when_cancelled() {
		let (mut worker, cancel) = worker(Duration::from_secs(30));

		assert!(!worker.is_interrupted());
		drop(cancel);

		let started = Instant::now();
		worker.backoff();
		assert!(started.elapsed() < Duration::from_secs(5));
		assert!(worker.is_interrupted());
	}

	#[test]
	fn test_exit_after_stop_reports_cancellation() {
		let (mut worker, cancel) = worker(Duration::from_millis(10));
		assert!(worker.lifecycle.try_start());
		assert!(worker.lifecycle.try_stop());
		drop(cancel);

		let mut session = Session(FakeConnector::default());
		assert_eq!(worker.poll(&mut session), Exit::Cancelled);
		assert_eq!(session.fetches, 0);
	}

	#[test]
	fn test_exit_on_state_change_without_cancellation() {
		let (mut worker, _cancel) = worker(Duration::from_millis(10));
		assert!(worker.lifecycle.try_start());
		assert!(worker.lifecycle.try_stop());

		let mut session = Session(FakeConnector::default());
		assert_eq!(worker.poll(&mut session), Exit::Stopped);
	}

	#[test]
	fn test_unsettled_batch_backs_off_then_continues() {
		let (mut worker, cancel) = worker(Duration::from_millis(10));
		assert!(worker.lifecycle.try_start());

		let mut session = Session(FakeConnector {
			fail_ack: true,
			..FakeConnector::default()
		});
		session.batches.push_back(Batch::new(1, vec![Entry::marker(EntryKind::Heartbeat)]));

		let lifecycle = worker.lifecycle.clone();
		let handle = std::thread::spawn(move || {
			let exit = worker.poll(&mut session);
			(exit, session.0.acks.clone(), session.fetches)
		});

		std::thread::sleep(Duration::from_millis(50));
		lifecycle.try_stop();
		drop(cancel);

		let (exit, acks, fetches) = handle.join().unwrap();
		assert_eq!(exit, Exit::Cancelled);
		assert_eq!(acks, vec![BatchId(1)]);
		assert!(fetches >= 2);
	}
}
