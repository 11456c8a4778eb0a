// src/ingest/reader.rs
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::table::{Cell, Table};

/// Seam to the workbook-decoding collaborator. The core never touches
/// spreadsheet binary containers; an adapter hands it named raw grids, one
/// per sheet.
pub trait WorkbookReader: Sync {
    /// All sheets of one workbook as `(sheet_name, raw_table)` pairs, at
    /// most `row_cap` data rows per sheet when set.
    fn read(&self, path: &Path, row_cap: Option<usize>) -> Result<Vec<(String, Table)>>;
}

/// CSV adapter used by the batch binary: one file is one single-sheet
/// workbook. Flexible on field counts so ragged rows pad with blanks.
pub struct CsvWorkbookReader;

/// Sheet name given to single-sheet CSV workbooks.
pub const DEFAULT_SHEET: &str = "Planilha1";

impl WorkbookReader for CsvWorkbookReader {
    fn read(&self, path: &Path, row_cap: Option<usize>) -> Result<Vec<(String, Table)>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;

        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("reading header row of {}", path.display()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut table = Table::new(headers);
        for (idx, record) in rdr.records().enumerate() {
            if let Some(cap) = row_cap {
                if idx >= cap {
                    break;
                }
            }
            let record = record
                .with_context(|| format!("CSV parse error in {} at row {}", path.display(), idx))?;
            let cells: Vec<Cell> = record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Blank
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect();
            table.push_row(cells);
        }

        Ok(vec![(DEFAULT_SHEET.to_string(), table)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_headers_rows_and_honors_the_cap() -> Result<()> {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile()?;
        writeln!(tmp, "Nome,Obra")?;
        writeln!(tmp, "Fundação,Obra A")?;
        writeln!(tmp, "Estrutura,Obra A")?;
        writeln!(tmp, "Fim Físico,Obra A")?;

        let sheets = CsvWorkbookReader.read(tmp.path(), Some(2))?;
        assert_eq!(sheets.len(), 1);
        let (name, table) = &sheets[0];
        assert_eq!(name, DEFAULT_SHEET);
        assert_eq!(table.headers, vec!["Nome", "Obra"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("Fundação".into()));
        Ok(())
    }

    #[test]
    fn blank_fields_become_blank_cells() -> Result<()> {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile()?;
        writeln!(tmp, "A,B")?;
        writeln!(tmp, "x,")?;

        let sheets = CsvWorkbookReader.read(tmp.path(), None)?;
        assert_eq!(sheets[0].1.rows[0][1], Cell::Blank);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        assert!(CsvWorkbookReader
            .read(Path::new("/nonexistent/file.csv"), None)
            .is_err());
    }
}
