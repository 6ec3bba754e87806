// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use rowtap_core::Result;

use super::ConsumerState;

/// Trait for CDC event stream consumers
///
/// Both operations are idempotent and may be called concurrently from any
/// thread.
pub trait CdcConsumer: Send + Sync {
	/// Spawns the worker on the first call, later calls do nothing.
	fn start(&self) -> Result<()>;

	/// Requests the worker to finish. Does not wait for it.
	fn stop(&self);

	fn state(&self) -> ConsumerState;

	fn is_running(&self) -> bool {
		self.state() == ConsumerState::Running
	}
}
