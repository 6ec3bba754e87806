// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use rowtap_cdc::{Handler, HandlerResult};
use rowtap_core::ChangeEvent;

use crate::{Call, CallLog};

/// How the next handler invocation answers.
#[derive(Debug, Clone)]
pub enum Reply {
	Accept,
	Fail(String),
	Panic(String),
}

/// Handler that records what it receives. Clones share their state, keep one
/// clone in the test and move the other into the consumer.
///
/// Answers with the scripted replies in order, then accepts everything.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
	log: CallLog,
	received: Arc<Mutex<Vec<Vec<ChangeEvent>>>>,
	replies: Arc<Mutex<VecDeque<Reply>>>,
}

impl RecordingHandler {
	pub fn new(log: CallLog) -> Self {
		Self {
			log,
			received: Arc::default(),
			replies: Arc::default(),
		}
	}

	pub fn reply(self, reply: Reply) -> Self {
		self.replies.lock().push_back(reply);
		self
	}

	/// Every invocation's events, including the ones it failed on.
	pub fn received(&self) -> Vec<Vec<ChangeEvent>> {
		self.received.lock().clone()
	}

	pub fn invocations(&self) -> usize {
		self.received.lock().len()
	}
}

impl Handler for RecordingHandler {
	fn resolve(&mut self, events: Vec<ChangeEvent>) -> HandlerResult {
		self.log.record(Call::Resolve(events.len()));
		self.received.lock().push(events);

		let reply = self.replies.lock().pop_front().unwrap_or(Reply::Accept);
		match reply {
			Reply::Accept => Ok(()),
			Reply::Fail(reason) => Err(reason.into()),
			Reply::Panic(reason) => panic!("{}", reason),
		}
	}
}
