//! CLI command handlers.
//!
//! Handlers write machine-readable JSON to the given writer and log to
//! stderr, so their output can be piped.

pub mod audit;
pub mod report;
pub mod worker;

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// Pretty-print `value` followed by a newline.
pub(crate) fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out).context("failed to write output")?;
    Ok(())
}
