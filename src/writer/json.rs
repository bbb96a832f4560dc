//! JSON output for dumps and save reports.

use std::io::{self, Write};

use serde::Serialize;

/// Pretty JSON followed by a newline.
pub fn emit<T: Serialize + ?Sized>(value: &T, mut out: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()
}
