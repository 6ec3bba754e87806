// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Column, EntryHeader, RowData, Value};

/// Snapshot of one row, column name to value, in source column order.
pub type Row = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
	Insert,
	Update,
	Delete,
}

impl Display for EventType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			EventType::Insert => f.write_str("INSERT"),
			EventType::Update => f.write_str("UPDATE"),
			EventType::Delete => f.write_str("DELETE"),
		}
	}
}

/// One row level mutation of a table.
///
/// Inserts only carry after images, deletes only before images. For updates
/// `rows_before[i]` and `rows_after[i]` describe the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
	schema: String,
	table: String,
	event_type: EventType,
	rows_before: Vec<Row>,
	rows_after: Vec<Row>,
}

impl ChangeEvent {
	/// Projects the row images of a payload according to `event_type`.
	pub fn project(header: &EntryHeader, event_type: EventType, rows: &[RowData]) -> Self {
		let mut rows_before = Vec::new();
		let mut rows_after = Vec::new();

		for row in rows {
			match event_type {
				EventType::Insert => rows_after.push(to_row(&row.after)),
				EventType::Delete => rows_before.push(to_row(&row.before)),
				EventType::Update => {
					rows_before.push(to_row(&row.before));
					rows_after.push(to_row(&row.after));
				}
			}
		}

		Self {
			schema: header.schema.clone(),
			table: header.table.clone(),
			event_type,
			rows_before,
			rows_after,
		}
	}

	pub fn schema(&self) -> &str {
		&self.schema
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn event_type(&self) -> EventType {
		self.event_type
	}

	pub fn rows_before(&self) -> &[Row] {
		&self.rows_before
	}

	pub fn rows_after(&self) -> &[Row] {
		&self.rows_after
	}

	/// Number of rows touched by this event.
	pub fn len(&self) -> usize {
		self.rows_before.len().max(self.rows_after.len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Iterates the touched rows as `(before, after)` pairs.
	pub fn rows(&self) -> impl Iterator<Item = (Option<&Row>, Option<&Row>)> + '_ {
		(0..self.len()).map(|i| (self.rows_before.get(i), self.rows_after.get(i)))
	}
}

fn to_row(columns: &[Column]) -> Row {
	let mut row = IndexMap::with_capacity(columns.len());
	for column in columns {
		row.insert(column.name.clone(), column.value.clone());
	}
	row
}
