use crate::output::traits::{OutputResult, RecordSink};
use crate::product::Product;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends one JSON object per line
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Creates (or truncates) the record file
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for JsonLinesSink {
    fn write_record(&mut self, product: &Product) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, product)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
