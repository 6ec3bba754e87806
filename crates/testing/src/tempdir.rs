// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{env, fs, io, path::Path};

use uuid::Uuid;

/// Runs `f` inside a fresh directory that is removed afterwards.
pub fn temp_dir<F>(f: F) -> io::Result<()>
where
	F: FnOnce(&Path) -> io::Result<()>,
{
	let mut path = env::temp_dir();
	path.push(format!("rowtap-{}", Uuid::new_v4()));

	fs::create_dir(&path)?;
	let result = f(&path);

	let _ = fs::remove_dir_all(&path);
	result
}
