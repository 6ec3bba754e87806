// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Error type shared by every rowtap crate.

use std::io;

use crate::BatchId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to connect to {address}: {reason}")]
	Connection {
		address: String,
		reason: String,
	},

	#[error("connector is not connected")]
	NotConnected,

	#[error("payload codec error: {0}")]
	Codec(String),

	#[error("malformed entry #{index} ({table}): {reason}")]
	Parse {
		index: usize,
		table: String,
		reason: String,
	},

	#[error("handler failed: {0}")]
	Handler(String),

	#[error("invalid subscription filter `{filter}`: {reason}")]
	Filter {
		filter: String,
		reason: String,
	},

	#[error("batch {0} was never handed out or is already acknowledged")]
	UnknownBatch(BatchId),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("failed to spawn worker thread: {0}")]
	Spawn(#[source] io::Error),

	#[error(transparent)]
	Io(#[from] io::Error),
}

impl Error {
	/// Stable diagnostic code, suitable for log based alerting.
	pub fn code(&self) -> &'static str {
		match self {
			Error::Connection {
				..
			} => "CDC_001",
			Error::NotConnected => "CDC_002",
			Error::Codec(_) => "CDC_003",
			Error::Parse {
				..
			} => "CDC_004",
			Error::Handler(_) => "CDC_005",
			Error::Filter {
				..
			} => "CDC_006",
			Error::UnknownBatch(_) => "CDC_007",
			Error::Config(_) => "CDC_008",
			Error::Spawn(_) => "CDC_009",
			Error::Io(_) => "CDC_010",
		}
	}

	pub fn connection(address: impl Into<String>, reason: impl ToString) -> Self {
		Error::Connection {
			address: address.into(),
			reason: reason.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_codes_are_distinct() {
		let errors = [
			Error::connection("127.0.0.1:11111", "refused"),
			Error::NotConnected,
			Error::Codec("x".into()),
			Error::Parse {
				index: 0,
				table: "t".into(),
				reason: "x".into(),
			},
			Error::Handler("x".into()),
			Error::Filter {
				filter: "(".into(),
				reason: "x".into(),
			},
			Error::UnknownBatch(BatchId(3)),
			Error::Config("x".into()),
			Error::Spawn(io::Error::other("x")),
			Error::Io(io::Error::other("x")),
		];

		let mut codes: Vec<_> = errors.iter().map(Error::code).collect();
		codes.sort();
		codes.dedup();
		assert_eq!(codes.len(), errors.len());
	}

	#[test]
	fn test_connection_message() {
		let err = Error::connection("127.0.0.1:11111", "refused");
		assert_eq!(err.to_string(), "failed to connect to 127.0.0.1:11111: refused");
	}
}
