//! Output sinks for assembled documents.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use kbscrape_shared::{KbScrapeError, Result};

/// Receives serialized documents in batch order.
pub trait DocumentSink {
    /// Append one document. Failures are fatal to the run.
    fn write_document(&mut self, document: &str) -> Result<()>;

    /// Flush buffered output once the batch is done.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink over any [`Write`], labelled for error messages.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
    label: PathBuf,
    written: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, label: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            label: label.into(),
            written: 0,
        }
    }

    /// Documents written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<BufWriter<File>> {
    /// Create (or truncate) an output file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| KbScrapeError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl WriterSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "<stdout>")
    }
}

impl<W: Write> DocumentSink for WriterSink<W> {
    fn write_document(&mut self, document: &str) -> Result<()> {
        self.writer
            .write_all(document.as_bytes())
            .map_err(|e| KbScrapeError::io(&self.label, e))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| KbScrapeError::io(&self.label, e))
    }
}
