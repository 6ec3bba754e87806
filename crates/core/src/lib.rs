// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use batch::{Batch, BatchId};
pub use change::{ChangeEvent, EventType, Row};
pub use config::{AckPolicy, ConsumerConfig, SourceConfig};
pub use entry::{Column, Entry, EntryHeader, EntryKind, RowChange, RowData, RowEventType};
pub use error::{Error, Result};
pub use filter::SubscriptionFilter;
pub use value::Value;

mod batch;
mod change;
pub mod config;
mod entry;
mod error;
mod filter;
mod value;
