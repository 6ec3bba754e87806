// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fs::File,
	io::{self, BufReader, Read, Seek, SeekFrom, Write},
};

use rowtap_core::{Entry, Error, Result};

const LENGTH_SIZE: u64 = 4;

/// Largest frame body accepted on either side of the log.
pub(crate) const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

pub(crate) fn write_frame<W: Write>(writer: &mut W, entry: &Entry) -> Result<()> {
	let body = postcard::to_stdvec(entry).map_err(|e| Error::Codec(e.to_string()))?;
	if body.len() > MAX_FRAME_SIZE {
		return Err(Error::Codec(format!("entry of {} bytes exceeds the frame limit", body.len())));
	}
	let len = body.len() as u32;

	writer.write_all(&len.to_be_bytes())?;
	writer.write_all(&body)?;
	Ok(())
}

/// Position in the log, after `frames` complete frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Position {
	pub frames: u64,
	pub offset: u64,
}

/// Reads complete frames from a log that may still be growing.
///
/// A frame cut short by the end of the file is not an error, it is treated
/// as not written yet and read again on the next call.
#[derive(Debug)]
pub(crate) struct FrameReader {
	reader: BufReader<File>,
	position: Position,
}

impl FrameReader {
	pub fn new(file: File) -> Self {
		Self {
			reader: BufReader::new(file),
			position: Position::default(),
		}
	}

	pub fn position(&self) -> Position {
		self.position
	}

	pub fn read_next(&mut self) -> Result<Option<Entry>> {
		let mut len = [0u8; LENGTH_SIZE as usize];
		if !self.fill(&mut len)? {
			return Ok(None);
		}

		let len = u32::from_be_bytes(len) as usize;
		if len > MAX_FRAME_SIZE {
			self.reader.seek(SeekFrom::Start(self.position.offset))?;
			return Err(Error::Codec(format!(
				"frame {} at offset {} claims {} bytes",
				self.position.frames, self.position.offset, len
			)));
		}

		let mut body = vec![0u8; len];
		if !self.fill(&mut body)? {
			return Ok(None);
		}

		let entry: Entry = match postcard::from_bytes(&body) {
			Ok(entry) => entry,
			Err(e) => {
				self.reader.seek(SeekFrom::Start(self.position.offset))?;
				return Err(Error::Codec(e.to_string()));
			}
		};
		self.position.frames += 1;
		self.position.offset += LENGTH_SIZE + body.len() as u64;
		Ok(Some(entry))
	}

	/// Moves back to a position handed out earlier.
	pub fn seek(&mut self, position: Position) -> Result<()> {
		self.reader.seek(SeekFrom::Start(position.offset))?;
		self.position = position;
		Ok(())
	}

	/// Skips `frames` frames from the start of the log, stopping early at
	/// its end.
	pub fn skip(&mut self, frames: u64) -> Result<Position> {
		self.seek(Position::default())?;
		while self.position.frames < frames {
			if self.read_next()?.is_none() {
				break;
			}
		}
		Ok(self.position)
	}

	/// Fills `buf` completely, or rewinds to the last complete frame and
	/// returns false.
	fn fill(&mut self, buf: &mut [u8]) -> Result<bool> {
		let mut read = 0;
		while read < buf.len() {
			match self.reader.read(&mut buf[read..]) {
				Ok(0) => {
					self.reader.seek(SeekFrom::Start(self.position.offset))?;
					return Ok(false);
				}
				Ok(n) => read += n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => {
					self.reader.seek(SeekFrom::Start(self.position.offset))?;
					return Err(e.into());
				}
			}
		}
		Ok(true)
	}
}
