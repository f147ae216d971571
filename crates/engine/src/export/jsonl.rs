use std::io::Write;

use crate::segment::Record;

use super::ExportError;

/// Write records as newline-delimited JSON, one object per line.
/// Returns the number of records written.
pub fn write_jsonl<'a, W, I>(writer: &mut W, records: I) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    let mut written = 0;
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
