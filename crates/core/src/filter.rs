// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use regex::Regex;

use crate::{Error, Result};

/// Table selection of a subscription.
///
/// A filter is a comma separated list of regular expressions, each matched
/// against the whole `schema.table` name. A blank filter selects everything.
#[derive(Debug, Clone)]
pub struct SubscriptionFilter {
	source: String,
	patterns: Vec<Regex>,
}

impl SubscriptionFilter {
	pub const MATCH_ALL: &'static str = r".*\..*";

	pub fn parse(filter: &str) -> Result<Self> {
		let mut patterns = Vec::new();

		for part in filter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
			let regex = Regex::new(&format!("^(?:{})$", part)).map_err(|e| Error::Filter {
				filter: filter.to_string(),
				reason: e.to_string(),
			})?;
			patterns.push(regex);
		}

		Ok(Self {
			source: filter.to_string(),
			patterns,
		})
	}

	pub fn match_all() -> Self {
		Self {
			source: String::new(),
			patterns: Vec::new(),
		}
	}

	pub fn matches(&self, schema: &str, table: &str) -> bool {
		if self.patterns.is_empty() {
			return true;
		}
		let name = format!("{}.{}", schema, table);
		self.patterns.iter().any(|p| p.is_match(&name))
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}
}

impl Default for SubscriptionFilter {
	fn default() -> Self {
		Self::match_all()
	}
}
