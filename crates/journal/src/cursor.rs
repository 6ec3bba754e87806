// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};

use rowtap_core::{Error, Result};

/// Durable count of acknowledged frames.
#[derive(Debug, Clone)]
pub struct Cursor {
	path: PathBuf,
}

impl Cursor {
	pub fn new(dir: &Path, destination: &str) -> Self {
		Self {
			path: crate::cursor_path(dir, destination),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Frames acknowledged so far, zero if nothing was ever acknowledged.
	pub fn fetch(&self) -> Result<u64> {
		let bytes = match fs::read(&self.path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(e.into()),
		};

		let buffer: [u8; 8] = bytes
			.as_slice()
			.try_into()
			.map_err(|_| Error::Codec(format!("cursor {} holds {} bytes", self.path.display(), bytes.len())))?;
		Ok(u64::from_be_bytes(buffer))
	}

	/// Replaces the stored count. Readers never observe a partial write.
	pub fn persist(&self, frames: u64) -> Result<()> {
		let tmp = self.path.with_extension("cursor.tmp");

		let mut file = File::create(&tmp)?;
		file.write_all(&frames.to_be_bytes())?;
		file.sync_all()?;
		fs::rename(&tmp, &self.path)?;
		Ok(())
	}
}
