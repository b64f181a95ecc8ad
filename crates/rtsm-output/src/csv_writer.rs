//! CSV rendering of views.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::OutputError;
use crate::views::Table;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write a table as CSV. A leading byte-order mark makes spreadsheet tools
/// pick UTF-8 when the file is opened directly.
pub fn write_table<W: Write>(mut out: W, table: &Table, bom: bool) -> csv::Result<()> {
    if bom {
        out.write_all(UTF8_BOM)?;
    }
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a table as CSV text without a byte-order mark.
pub fn render_csv(table: &Table) -> csv::Result<String> {
    let mut buffer = Vec::new();
    write_table(&mut buffer, table, false)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_table_csv(path: &Path, table: &Table, bom: bool) -> Result<(), OutputError> {
    let file = File::create(path).map_err(|error| OutputError::io(path, error))?;
    write_table(BufWriter::new(file), table, bom).map_err(|error| OutputError::csv(path, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table {
            headers: vec!["labels".to_string(), "site".to_string()],
            rows: vec![
                vec!["001/002".to_string(), "18".to_string()],
                vec!["a,b".to_string(), "19".to_string()],
            ],
        }
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let text = render_csv(&table()).unwrap();
        assert_eq!(text, "labels,site\n001/002,18\n\"a,b\",19\n");
    }

    #[test]
    fn bom_is_prepended() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &table(), true).unwrap();
        assert!(buffer.starts_with(UTF8_BOM));
        assert!(buffer[UTF8_BOM.len()..].starts_with(b"labels,site\n"));
    }
}
