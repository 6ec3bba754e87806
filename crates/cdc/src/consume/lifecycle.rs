// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{self, Display, Formatter},
	sync::atomic::{AtomicU8, Ordering},
};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerState {
	/// Created, never started
	Idle = 0,
	Running = 1,
	/// Terminal, a stopped consumer cannot be started again
	Stopped = 2,
}

impl ConsumerState {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => ConsumerState::Idle,
			1 => ConsumerState::Running,
			_ => ConsumerState::Stopped,
		}
	}
}

impl Display for ConsumerState {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			ConsumerState::Idle => f.write_str("IDLE"),
			ConsumerState::Running => f.write_str("RUNNING"),
			ConsumerState::Stopped => f.write_str("STOPPED"),
		}
	}
}

/// Consumer state machine, `Idle -> Running -> Stopped`.
///
/// Transitions are single compare-and-set operations, so among concurrent
/// callers exactly one wins each transition.
#[derive(Debug)]
pub struct Lifecycle {
	state: AtomicU8,
}

impl Lifecycle {
	pub fn new() -> Self {
		Self {
			state: AtomicU8::new(ConsumerState::Idle as u8),
		}
	}

	pub fn state(&self) -> ConsumerState {
		ConsumerState::from_u8(self.state.load(Ordering::Acquire))
	}

	pub fn is_running(&self) -> bool {
		self.state() == ConsumerState::Running
	}

	/// `Idle -> Running`, true only for the caller that made the transition.
	pub fn try_start(&self) -> bool {
		self.transition(ConsumerState::Idle, ConsumerState::Running)
	}

	/// `Running -> Stopped`, true only for the caller that made the transition.
	pub fn try_stop(&self) -> bool {
		self.transition(ConsumerState::Running, ConsumerState::Stopped)
	}

	fn transition(&self, from: ConsumerState, to: ConsumerState) -> bool {
		self.state.compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire).is_ok()
	}
}

impl Default for Lifecycle {
	fn default() -> Self {
		Self::new()
	}
}
