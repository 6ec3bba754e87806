// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	env, fs,
	io::{self, BufRead, ErrorKind},
	path::PathBuf,
	process::ExitCode,
};

use rowtap_cdc::{CdcConsumer, LoggingHandler, PollConsumer};
use rowtap_core::{ConsumerConfig, Error, Result};
use rowtap_journal::JournalConnector;
use serde::Deserialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "ROWTAP_CONFIG";
const DEFAULT_CONFIG: &str = "rowtap.json";

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TailConfig {
	consumer: ConsumerConfig,
	/// Directory holding the journal of `consumer.source.destination`
	journal: PathBuf,
}

impl Default for TailConfig {
	fn default() -> Self {
		Self {
			consumer: ConsumerConfig::default(),
			journal: PathBuf::from("journal"),
		}
	}
}

fn logging_configuration() {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(io::stderr)
		.init();
}

/// Reads the file named by `ROWTAP_CONFIG`, or `rowtap.json` if it exists.
fn load_config() -> Result<TailConfig> {
	let (path, required) = match env::var_os(CONFIG_ENV) {
		Some(path) => (PathBuf::from(path), true),
		None => (PathBuf::from(DEFAULT_CONFIG), false),
	};

	let json = match fs::read_to_string(&path) {
		Ok(json) => json,
		Err(e) if !required && e.kind() == ErrorKind::NotFound => {
			info!("{} not found, using defaults", path.display());
			return Ok(TailConfig::default());
		}
		Err(e) => return Err(Error::Config(format!("{}: {}", path.display(), e))),
	};

	let config: TailConfig =
		serde_json::from_str(&json).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
	config.consumer.validate()?;
	Ok(config)
}

fn main() -> ExitCode {
	logging_configuration();

	let config = match load_config() {
		Ok(config) => config,
		Err(err) => {
			error!(code = err.code(), "{}", err);
			return ExitCode::FAILURE;
		}
	};

	let connector = JournalConnector::from_config(&config.journal, &config.consumer.source);
	info!(address = %connector.address(), "tailing journal");
	let consumer = PollConsumer::new(config.consumer, connector, LoggingHandler);

	println!("press enter to start the consumer, `q` to stop it and exit");
	for line in io::stdin().lock().lines() {
		let line = match line {
			Ok(line) => line,
			Err(err) => {
				error!("failed to read stdin: {}", err);
				break;
			}
		};

		if line.trim() == "q" {
			break;
		}
		if let Err(err) = consumer.start() {
			error!(code = err.code(), "failed to start consumer: {}", err);
		}
	}

	consumer.stop();
	match consumer.join() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!(code = err.code(), "consumer failed: {}", err);
			ExitCode::FAILURE
		}
	}
}
