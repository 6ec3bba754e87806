// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Raw replication log entries and their row change payload.
//!
//! An [`Entry`] is what a source hands out inside a batch: a kind tag, a
//! header naming the affected table and an opaque payload. Only entries of
//! kind [`EntryKind::RowData`] carry a payload that decodes into a
//! [`RowChange`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Value, change::EventType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
	TransactionBegin,
	RowData,
	TransactionEnd,
	Heartbeat,
	Gtid,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryHeader {
	pub schema: String,
	pub table: String,
	/// Milliseconds since epoch at which the source executed the change
	pub execute_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
	pub kind: EntryKind,
	pub header: EntryHeader,
	#[serde(with = "serde_bytes")]
	pub payload: Vec<u8>,
}

impl Entry {
	pub fn new(kind: EntryKind, header: EntryHeader, payload: Vec<u8>) -> Self {
		Self {
			kind,
			header,
			payload,
		}
	}

	/// Builds a row data entry carrying the encoded `change`.
	pub fn row_data(schema: impl Into<String>, table: impl Into<String>, change: &RowChange) -> Result<Self> {
		Ok(Self::new(
			EntryKind::RowData,
			EntryHeader {
				schema: schema.into(),
				table: table.into(),
				execute_time: 0,
			},
			change.encode()?,
		))
	}

	/// Builds a payload-less marker entry (transaction boundaries, heartbeats).
	pub fn marker(kind: EntryKind) -> Self {
		Self::new(kind, EntryHeader::default(), Vec::new())
	}

	pub fn with_execute_time(mut self, execute_time: u64) -> Self {
		self.header.execute_time = execute_time;
		self
	}

	pub fn is_row_data(&self) -> bool {
		self.kind == EntryKind::RowData
	}

	/// `schema.table`, the name subscription filters match against.
	pub fn qualified_name(&self) -> String {
		format!("{}.{}", self.header.schema, self.header.table)
	}
}

/// Event type tag of a row change payload.
///
/// Besides the three row mutations a source reports structural statements
/// through the same payload, those never become change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowEventType {
	Insert,
	Update,
	Delete,
	Create,
	Alter,
	Erase,
	Query,
	Truncate,
	Rename,
	CreateIndex,
	DropIndex,
}

impl RowEventType {
	/// The row mutation this tag stands for, `None` for everything else.
	pub fn as_event_type(&self) -> Option<EventType> {
		match self {
			RowEventType::Insert => Some(EventType::Insert),
			RowEventType::Update => Some(EventType::Update),
			RowEventType::Delete => Some(EventType::Delete),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
	pub name: String,
	pub value: Value,
	pub is_key: bool,
	pub updated: bool,
}

impl Column {
	pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			is_key: false,
			updated: false,
		}
	}

	pub fn key(mut self) -> Self {
		self.is_key = true;
		self
	}

	pub fn updated(mut self) -> Self {
		self.updated = true;
		self
	}
}

/// Before and after images of a single changed row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RowData {
	pub before: Vec<Column>,
	pub after: Vec<Column>,
}

impl RowData {
	pub fn new(before: Vec<Column>, after: Vec<Column>) -> Self {
		Self {
			before,
			after,
		}
	}
}

/// Decoded payload of a row data entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
	pub event_type: RowEventType,
	pub is_ddl: bool,
	pub sql: Option<String>,
	pub rows: Vec<RowData>,
}

impl RowChange {
	pub fn new(event_type: RowEventType, rows: Vec<RowData>) -> Self {
		Self {
			event_type,
			is_ddl: false,
			sql: None,
			rows,
		}
	}

	pub fn insert(after: Vec<Vec<Column>>) -> Self {
		Self::new(RowEventType::Insert, after.into_iter().map(|a| RowData::new(vec![], a)).collect())
	}

	pub fn update(rows: Vec<(Vec<Column>, Vec<Column>)>) -> Self {
		Self::new(RowEventType::Update, rows.into_iter().map(|(b, a)| RowData::new(b, a)).collect())
	}

	pub fn delete(before: Vec<Vec<Column>>) -> Self {
		Self::new(RowEventType::Delete, before.into_iter().map(|b| RowData::new(b, vec![])).collect())
	}

	pub fn ddl(event_type: RowEventType, sql: impl Into<String>) -> Self {
		Self {
			event_type,
			is_ddl: true,
			sql: Some(sql.into()),
			rows: vec![],
		}
	}

	pub fn encode(&self) -> Result<Vec<u8>> {
		postcard::to_stdvec(self).map_err(|e| Error::Codec(e.to_string()))
	}

	pub fn decode(payload: &[u8]) -> Result<Self> {
		postcard::from_bytes(payload).map_err(|e| Error::Codec(e.to_string()))
	}
}
