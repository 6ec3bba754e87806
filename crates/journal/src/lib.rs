// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! A change log kept in plain files.
//!
//! For a destination `d` inside directory `dir` the journal consists of
//!
//! - `dir/d.log`, a sequence of frames, each a 4 byte big endian length
//!   followed by a postcard encoded [`Entry`](rowtap_core::Entry)
//! - `dir/d.cursor`, the number of frames acknowledged so far, 8 bytes big
//!   endian
//!
//! [`JournalWriter`] appends to the log, [`JournalConnector`] consumes it.

mod connector;
mod cursor;
mod frame;
mod writer;

pub use connector::JournalConnector;
pub use cursor::Cursor;
pub use writer::JournalWriter;

use std::path::{Path, PathBuf};

pub(crate) fn log_path(dir: &Path, destination: &str) -> PathBuf {
	dir.join(format!("{destination}.log"))
}

pub(crate) fn cursor_path(dir: &Path, destination: &str) -> PathBuf {
	dir.join(format!("{destination}.cursor"))
}
