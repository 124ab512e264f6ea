use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{VtiDocument, TRAILER};
use crate::error::Result;

#[derive(Default)]
pub struct VtiWriter {}

impl VtiWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// Creates (or truncates) `output_path` and writes `doc` in one pass.
    pub fn write(&self, doc: &VtiDocument, output_path: &Path) -> Result<()> {
        // the byte count must be valid before anything touches the file
        doc.byte_count()?;

        tracing::info!(
            "Writing VTI: {} x {} x {} points to {:?}",
            doc.grid.nx,
            doc.grid.ny,
            doc.grid.nz,
            output_path
        );

        let file = File::create(output_path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(doc, &mut writer)?;
        writer.flush()?;

        Ok(())
    }

    pub fn write_to<W: Write>(&self, doc: &VtiDocument, writer: &mut W) -> Result<()> {
        let byte_count = doc.byte_count()?;

        writer.write_all(doc.header().as_bytes())?;
        writer.write_all(&byte_count.to_le_bytes())?;
        for value in &doc.values {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.write_all(TRAILER.as_bytes())?;

        Ok(())
    }

    pub fn to_bytes(&self, doc: &VtiDocument) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(doc.header().len() + doc.values.len() * 4 + 64);
        self.write_to(doc, &mut bytes)?;
        Ok(bytes)
    }
}
