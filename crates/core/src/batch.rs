// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{self, Display, Formatter},
	ops::Deref,
};

use serde::{Deserialize, Serialize};

use crate::Entry;

/// Source assigned batch identifier, only ever handed back on ack.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub i64);

impl BatchId {
	/// Sentinel carried by a fetch that found nothing to deliver.
	pub const NONE: BatchId = BatchId(-1);

	pub fn is_none(&self) -> bool {
		*self == Self::NONE
	}
}

impl Display for BatchId {
	fn fmt(&self, f: &mut Formatter) -> fmt::Result {
		Display::fmt(&self.0, f)
	}
}

impl Deref for BatchId {
	type Target = i64;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl PartialEq<i64> for BatchId {
	fn eq(&self, other: &i64) -> bool {
		self.0.eq(other)
	}
}

impl From<i64> for BatchId {
	fn from(value: i64) -> Self {
		BatchId(value)
	}
}

impl From<BatchId> for i64 {
	fn from(value: BatchId) -> Self {
		value.0
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
	pub id: BatchId,
	pub entries: Vec<Entry>,
}

impl Batch {
	pub fn new(id: impl Into<BatchId>, entries: Vec<Entry>) -> Self {
		Self {
			id: id.into(),
			entries,
		}
	}

	pub fn empty() -> Self {
		Self {
			id: BatchId::NONE,
			entries: Vec::new(),
		}
	}

	/// True when there is nothing to process, either because the source
	/// returned the sentinel id or because no entries came back.
	pub fn is_empty(&self) -> bool {
		self.id.is_none() || self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}
}
