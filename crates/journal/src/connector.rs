// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::VecDeque,
	fs::File,
	io::ErrorKind,
	path::{Path, PathBuf},
};

use rowtap_cdc::Connector;
use rowtap_core::{Batch, BatchId, Error, Result, SourceConfig, SubscriptionFilter};
use tracing::{debug, trace, warn};

use crate::{
	Cursor,
	frame::{FrameReader, Position},
};

/// Consumes a journal log.
///
/// Batches are handed out from the last acknowledged frame on. Row data of
/// tables outside the subscription is consumed but not delivered. Credentials
/// of the source config are ignored.
#[derive(Debug)]
pub struct JournalConnector {
	path: PathBuf,
	cursor: Cursor,
	next_id: i64,
	session: Option<Session>,
}

#[derive(Debug)]
struct Session {
	reader: FrameReader,
	filter: SubscriptionFilter,
	acked: Position,
	outstanding: VecDeque<(BatchId, Position)>,
}

impl JournalConnector {
	pub fn new(dir: &Path, destination: &str) -> Self {
		Self {
			path: crate::log_path(dir, destination),
			cursor: Cursor::new(dir, destination),
			next_id: 0,
			session: None,
		}
	}

	pub fn from_config(dir: &Path, source: &SourceConfig) -> Self {
		Self::new(dir, &source.destination)
	}

	pub fn address(&self) -> String {
		format!("journal:{}", self.path.display())
	}

	fn session(&mut self) -> Result<&mut Session> {
		self.session.as_mut().ok_or(Error::NotConnected)
	}
}

impl Connector for JournalConnector {
	fn connect(&mut self) -> Result<()> {
		let file = File::open(&self.path).map_err(|e| match e.kind() {
			ErrorKind::NotFound => Error::connection(self.address(), "journal does not exist"),
			_ => Error::connection(self.address(), e),
		})?;

		let frames = self.cursor.fetch()?;
		let mut reader = FrameReader::new(file);
		let acked = reader.skip(frames)?;
		if acked.frames < frames {
			warn!(
				cursor = frames,
				available = acked.frames,
				"journal is shorter than its cursor, resuming at its end"
			);
		}

		debug!(address = %self.address(), frames = acked.frames, "journal opened");
		self.session = Some(Session {
			reader,
			filter: SubscriptionFilter::match_all(),
			acked,
			outstanding: VecDeque::new(),
		});
		Ok(())
	}

	fn subscribe(&mut self, filter: &str) -> Result<()> {
		let filter = SubscriptionFilter::parse(filter)?;
		self.session()?.filter = filter;
		Ok(())
	}

	fn rollback(&mut self) -> Result<()> {
		let session = self.session()?;
		session.outstanding.clear();
		let acked = session.acked;
		session.reader.seek(acked)
	}

	fn fetch(&mut self, max_size: usize) -> Result<Batch> {
		let session = self.session.as_mut().ok_or(Error::NotConnected)?;
		let start = session.reader.position();
		let mut entries = Vec::new();

		while entries.len() < max_size.max(1) {
			let entry = match session.reader.read_next() {
				Ok(Some(entry)) => entry,
				Ok(None) => break,
				// hand out what was read so far, the next fetch reports the error
				Err(err) if session.reader.position() != start => {
					debug!("stopping batch before unreadable frame: {}", err);
					break;
				}
				Err(err) => return Err(err),
			};

			if entry.is_row_data() && !session.filter.matches(&entry.header.schema, &entry.header.table) {
				continue;
			}
			entries.push(entry);
		}

		let end = session.reader.position();
		if end == start {
			return Ok(Batch::empty());
		}

		if entries.is_empty() {
			// only frames outside the subscription, settled right away when
			// nothing before them is still outstanding
			if session.outstanding.is_empty() {
				self.cursor.persist(end.frames)?;
				session.acked = end;
			}
			trace!(frames = end.frames - start.frames, "skipped unsubscribed frames");
			return Ok(Batch::empty());
		}

		self.next_id += 1;
		let id = BatchId(self.next_id);
		session.outstanding.push_back((id, end));
		Ok(Batch::new(id, entries))
	}

	fn ack(&mut self, batch_id: BatchId) -> Result<()> {
		let session = self.session.as_mut().ok_or(Error::NotConnected)?;

		let Some(index) = session.outstanding.iter().position(|(id, _)| *id == batch_id) else {
			return Err(Error::UnknownBatch(batch_id));
		};

		let Some((_, mut acked)) = session.outstanding.drain(..=index).last() else {
			return Err(Error::UnknownBatch(batch_id));
		};
		// past the last outstanding batch the reader only skipped unsubscribed frames
		if session.outstanding.is_empty() {
			acked = session.reader.position();
		}

		self.cursor.persist(acked.frames)?;
		session.acked = acked;
		Ok(())
	}

	fn disconnect(&mut self) -> Result<()> {
		if self.session.take().is_some() {
			debug!(address = %self.address(), "journal closed");
		}
		Ok(())
	}
}
