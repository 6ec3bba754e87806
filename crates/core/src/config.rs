// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Consumer configuration.
//!
//! Configuration is a plain value handed to the consumer when it is built and
//! never changes afterwards.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, SubscriptionFilter};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 11111;
pub const DEFAULT_DESTINATION: &str = "example";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Where the replication log lives and how to authenticate against it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	/// Name of the replication source on the server side
	pub destination: String,
}

impl SourceConfig {
	pub fn address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

impl Default for SourceConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			port: DEFAULT_PORT,
			username: String::new(),
			password: String::new(),
			destination: DEFAULT_DESTINATION.to_string(),
		}
	}
}

impl fmt::Debug for SourceConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SourceConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("password", &"***")
			.field("destination", &self.destination)
			.finish()
	}
}

/// When a processed batch gets acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
	/// Ack every batch once the handler returned, even when parsing or the
	/// handler failed. A failed batch is not redelivered.
	#[default]
	Always,
	/// Ack only batches that were handled successfully, roll back otherwise
	/// so the batch is delivered again.
	OnSuccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
	pub source: SourceConfig,
	/// Tables to stream, see [`SubscriptionFilter`]
	pub filter: String,
	/// Upper bound of entries per fetch
	pub max_batch_size: usize,
	/// Pause between fetches while the source has nothing new
	#[serde(rename = "backoff_ms", with = "millis")]
	pub backoff: Duration,
	pub ack_policy: AckPolicy,
}

impl ConsumerConfig {
	pub fn new(source: SourceConfig) -> Self {
		Self {
			source,
			..Self::default()
		}
	}

	pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
		self.filter = filter.into();
		self
	}

	pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
		self.max_batch_size = max_batch_size;
		self
	}

	pub fn with_backoff(mut self, backoff: Duration) -> Self {
		self.backoff = backoff;
		self
	}

	pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
		self.ack_policy = ack_policy;
		self
	}

	pub fn validate(&self) -> Result<()> {
		if self.max_batch_size == 0 {
			return Err(Error::Config("max_batch_size must be at least 1".to_string()));
		}
		if self.source.destination.is_empty() {
			return Err(Error::Config("source destination must not be empty".to_string()));
		}
		SubscriptionFilter::parse(&self.filter)?;
		Ok(())
	}
}

impl Default for ConsumerConfig {
	fn default() -> Self {
		Self {
			source: SourceConfig::default(),
			filter: SubscriptionFilter::MATCH_ALL.to_string(),
			max_batch_size: DEFAULT_MAX_BATCH_SIZE,
			backoff: DEFAULT_BACKOFF,
			ack_policy: AckPolicy::default(),
		}
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}
