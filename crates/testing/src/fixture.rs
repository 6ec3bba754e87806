// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Entry builders for a `shop.users (id, name)` table.

use rowtap_core::{Column, Entry, EntryKind, RowChange, RowEventType};

pub const SCHEMA: &str = "shop";
pub const TABLE: &str = "users";

pub fn user(id: i64, name: &str) -> Vec<Column> {
	vec![Column::new("id", id).key(), Column::new("name", name)]
}

pub fn row_entry(change: &RowChange) -> Entry {
	Entry::row_data(SCHEMA, TABLE, change).expect("failed to encode row change")
}

pub fn insert_user(id: i64, name: &str) -> Entry {
	row_entry(&RowChange::insert(vec![user(id, name)]))
}

pub fn update_user(id: i64, before: &str, after: &str) -> Entry {
	let mut after = user(id, after);
	after[1] = after[1].clone().updated();
	row_entry(&RowChange::update(vec![(user(id, before), after)]))
}

pub fn delete_user(id: i64, name: &str) -> Entry {
	row_entry(&RowChange::delete(vec![user(id, name)]))
}

pub fn ddl(event_type: RowEventType, sql: &str) -> Entry {
	row_entry(&RowChange::ddl(event_type, sql))
}

/// Row entry whose payload cannot be decoded.
pub fn malformed() -> Entry {
	let mut entry = insert_user(0, "broken");
	entry.payload = vec![0xff; 4];
	entry
}

pub fn begin() -> Entry {
	Entry::marker(EntryKind::TransactionBegin)
}

pub fn end() -> Entry {
	Entry::marker(EntryKind::TransactionEnd)
}

pub fn heartbeat() -> Entry {
	Entry::marker(EntryKind::Heartbeat)
}
