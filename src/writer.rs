//! Per-element result rendering, delegated to an external writer factory.
//! The concrete format — CSV, JSON, plain text — is not part of the core:
//! it only requires a line-oriented sink with `write_record`, writing one
//! record per value in production order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A line-oriented sink for a single stage's results.
pub trait ResultWriter<T>: Send {
    fn write_record(&mut self, value: &T) -> std::io::Result<()>;

    /// Flushes and releases any held resources. Called exactly once, when
    /// the owning stage reaches end-of-stream.
    fn close(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Constructs a [`ResultWriter`] for a declared element type, given the
/// output path it should render to.
pub trait WriterFactory<T>: Send + Sync {
    fn create(&self, path: &Path) -> std::io::Result<Box<dyn ResultWriter<T>>>;

    /// File extension (without the leading dot) used when naming result
    /// artifacts, e.g. `"txt"`, `"csv"`, `"json"`.
    fn extension(&self) -> &str;
}

/// Default writer: one line per value, rendered with `Display`. This is
/// the core's "no particular format" fallback — concrete deployments are
/// expected to supply their own `WriterFactory` (e.g. CSV or JSON) for
/// structured element types.
pub struct LineWriter {
    file: BufWriter<File>,
}

impl<T: std::fmt::Display> ResultWriter<T> for LineWriter {
    fn write_record(&mut self, value: &T) -> std::io::Result<()> {
        writeln!(self.file, "{value}")
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

pub struct LineWriterFactory;

impl<T: std::fmt::Display> WriterFactory<T> for LineWriterFactory {
    fn create(&self, path: &Path) -> std::io::Result<Box<dyn ResultWriter<T>>> {
        let file = File::create(path)?;
        Ok(Box::new(LineWriter {
            file: BufWriter::new(file),
        }))
    }

    fn extension(&self) -> &str {
        "txt"
    }
}
