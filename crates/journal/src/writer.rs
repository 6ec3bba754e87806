// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fs::{self, File, OpenOptions},
	io::{BufWriter, Write},
	path::{Path, PathBuf},
	time::{SystemTime, UNIX_EPOCH},
};

use rowtap_core::{Entry, EntryKind, Result, RowChange};
use tracing::trace;

use crate::frame::write_frame;

/// Appends entries to a journal log.
///
/// Every append is flushed before it returns, so a concurrently running
/// [`JournalConnector`](crate::JournalConnector) sees whole transactions.
#[derive(Debug)]
pub struct JournalWriter {
	path: PathBuf,
	writer: BufWriter<File>,
}

impl JournalWriter {
	/// Opens the log of `destination`, creating `dir` and the log as needed.
	pub fn open(dir: &Path, destination: &str) -> Result<Self> {
		fs::create_dir_all(dir)?;
		let path = crate::log_path(dir, destination);
		let file = OpenOptions::new().create(true).append(true).open(&path)?;

		Ok(Self {
			path,
			writer: BufWriter::new(file),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn append(&mut self, entry: &Entry) -> Result<()> {
		write_frame(&mut self.writer, entry)?;
		self.writer.flush()?;
		trace!(kind = ?entry.kind, table = %entry.qualified_name(), "appended entry");
		Ok(())
	}

	/// Appends `change` stamped with the current wall clock time.
	pub fn append_row_change(&mut self, schema: &str, table: &str, change: &RowChange) -> Result<()> {
		self.append(&Entry::row_data(schema, table, change)?.with_execute_time(now_millis()))
	}

	/// Appends `entries` framed by transaction begin and end markers.
	pub fn append_transaction(&mut self, entries: &[Entry]) -> Result<()> {
		write_frame(&mut self.writer, &Entry::marker(EntryKind::TransactionBegin))?;
		for entry in entries {
			write_frame(&mut self.writer, entry)?;
		}
		write_frame(&mut self.writer, &Entry::marker(EntryKind::TransactionEnd))?;
		self.writer.flush()?;
		trace!(entries = entries.len(), "appended transaction");
		Ok(())
	}
}

fn now_millis() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or_default()
}
