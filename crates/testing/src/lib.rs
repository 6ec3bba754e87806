// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Test doubles and helpers shared by the rowtap test suites.

pub mod fixture;
mod handler;
mod log;
mod mock;
pub mod tempdir;
pub mod wait;

pub use handler::{RecordingHandler, Reply};
pub use log::{Call, CallLog};
pub use mock::{Feed, MockConnector};
