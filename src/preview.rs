//! Bounded preview of tabular input files.
//!
//! Reads the leading content of a CSV or XLSX file for display only: a
//! header row plus at most [PREVIEW_ROW_LIMIT] data rows. XLSX workbooks
//! are read directly from their ZIP container, parsing the first
//! worksheet and the shared-strings part.

use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use zip::ZipArchive;

use crate::table::{Row, Table};

/// Maximum number of data rows in a preview.
pub const PREVIEW_ROW_LIMIT: usize = 10;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEETS_PREFIX: &str = "xl/worksheets/";

/// Leading content of a tabular file.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct Preview {
    pub header: Row,
    pub rows: Table,
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PreviewError {
    #[error("unsupported preview file type {extension:?} (expected .csv or .xlsx)")]
    UnsupportedType { extension: String },
    #[error("legacy .xls workbooks are not supported; convert to .xlsx")]
    LegacyXls,
    #[error("file contains no rows")]
    Empty,
}

/// Reads the preview of the file at `path`, dispatching on its extension.
pub fn preview_file(path: &Path) -> Result<Preview> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => preview_csv(path),
        "xlsx" => preview_xlsx(path),
        "xls" => Err(PreviewError::LegacyXls.into()),
        _ => Err(PreviewError::UnsupportedType { extension }.into()),
    }
}

fn preview_csv(path: &Path) -> Result<Preview> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV file {:?}", path))?;

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record_to_row(record.with_context(|| "reading CSV header")?),
        None => return Err(PreviewError::Empty.into()),
    };

    let mut rows = Table::default();
    for record in records.take(PREVIEW_ROW_LIMIT) {
        rows.push(record_to_row(
            record.with_context(|| "reading CSV record")?,
        ));
    }

    Ok(Preview { header, rows })
}

fn record_to_row(record: csv::StringRecord) -> Row {
    record.iter().collect::<Vec<_>>().into()
}

fn preview_xlsx(path: &Path) -> Result<Preview> {
    let file = File::open(path).with_context(|| format!("opening workbook {:?}", path))?;
    let mut archive =
        ZipArchive::new(file).with_context(|| format!("reading workbook container {:?}", path))?;

    let shared = read_shared_strings(&mut archive)?;

    let sheet_name = first_worksheet_name(&archive).ok_or(PreviewError::Empty)?;
    let sheet_xml = read_part(&mut archive, &sheet_name)?;
    let worksheet: Worksheet =
        quick_xml::de::from_str(&sheet_xml).with_context(|| "parsing worksheet XML")?;

    let mut sheet_rows = worksheet.sheet_data.rows.into_iter();
    let header = match sheet_rows.next() {
        Some(row) => row_from_cells(&row.cells, &shared),
        None => return Err(PreviewError::Empty.into()),
    };
    let rows: Table = sheet_rows
        .take(PREVIEW_ROW_LIMIT)
        .map(|row| row_from_cells(&row.cells, &shared))
        .collect::<Vec<_>>()
        .into();

    Ok(Preview { header, rows })
}

/// Returns the lexically first worksheet part name. Workbooks name their
/// sheet parts `sheet1.xml`, `sheet2.xml`, and so on.
fn first_worksheet_name(archive: &ZipArchive<File>) -> Option<String> {
    archive
        .file_names()
        .filter(|name| name.starts_with(WORKSHEETS_PREFIX) && name.ends_with(".xml"))
        .min()
        .map(str::to_owned)
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut part = archive
        .by_name(name)
        .with_context(|| format!("opening workbook part {:?}", name))?;
    let mut text = String::new();
    part.read_to_string(&mut text)
        .with_context(|| format!("reading workbook part {:?}", name))?;
    Ok(text)
}

fn read_shared_strings(archive: &mut ZipArchive<File>) -> Result<Vec<String>> {
    // The part is absent in workbooks without shared text cells.
    match archive.by_name(SHARED_STRINGS_PART) {
        Err(zip::result::ZipError::FileNotFound) => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("opening {:?}", SHARED_STRINGS_PART));
        }
        Ok(mut part) => {
            let mut text = String::new();
            part.read_to_string(&mut text)
                .with_context(|| format!("reading {:?}", SHARED_STRINGS_PART))?;
            let strings: SharedStrings =
                quick_xml::de::from_str(&text).with_context(|| "parsing shared strings XML")?;
            Ok(strings.items.into_iter().map(SharedItem::text).collect())
        }
    }
}

fn row_from_cells(cells: &[SheetCell], shared: &[String]) -> Row {
    let mut out: Vec<String> = Vec::with_capacity(cells.len());
    for cell in cells {
        // Gap-fill from the cell reference, as sparse rows omit empty cells.
        if let Some(index) = cell.reference.as_deref().and_then(column_index) {
            while out.len() < index {
                out.push(String::new());
            }
        }
        out.push(cell_text(cell, shared));
    }
    Row(out)
}

fn cell_text(cell: &SheetCell, shared: &[String]) -> String {
    match cell.cell_type.as_deref() {
        Some("s") => cell
            .value
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i))
            .cloned()
            .unwrap_or_default(),
        Some("inlineStr") => cell
            .inline
            .as_ref()
            .and_then(|inline| inline.text.clone())
            .unwrap_or_default(),
        _ => cell.value.clone().unwrap_or_default(),
    }
}

/// Converts an `A1`-style cell reference to a zero-based column index.
fn column_index(cell_ref: &str) -> Option<usize> {
    let mut index: usize = 0;
    let mut seen = false;
    for c in cell_ref.chars() {
        if !c.is_ascii_alphabetic() {
            break;
        }
        seen = true;
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    if seen { Some(index - 1) } else { None }
}

#[derive(Debug, Deserialize)]
struct Worksheet {
    #[serde(rename = "sheetData")]
    sheet_data: SheetData,
}

#[derive(Debug, Deserialize)]
struct SheetData {
    #[serde(rename = "row", default)]
    rows: Vec<SheetRow>,
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    #[serde(rename = "c", default)]
    cells: Vec<SheetCell>,
}

#[derive(Debug, Deserialize)]
struct SheetCell {
    #[serde(rename = "@r")]
    reference: Option<String>,
    #[serde(rename = "@t")]
    cell_type: Option<String>,
    #[serde(rename = "v")]
    value: Option<String>,
    #[serde(rename = "is")]
    inline: Option<InlineString>,
}

#[derive(Debug, Deserialize)]
struct InlineString {
    #[serde(rename = "t")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharedStrings {
    #[serde(rename = "si", default)]
    items: Vec<SharedItem>,
}

#[derive(Debug, Deserialize)]
struct SharedItem {
    #[serde(rename = "t")]
    plain: Option<String>,
    #[serde(rename = "r", default)]
    runs: Vec<RichRun>,
}

impl SharedItem {
    /// Flattens a shared-string item, which is either plain text or a
    /// sequence of rich-text runs.
    fn text(self) -> String {
        match self.plain {
            Some(plain) => plain,
            None => self
                .runs
                .into_iter()
                .filter_map(|run| run.text)
                .collect::<Vec<_>>()
                .concat(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RichRun {
    #[serde(rename = "t")]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::{fmt::Write as _, fs, fs::File, io::Write as _, path::Path};

    use googletest::{
        assert_that,
        matchers::{eq, err},
    };
    use tempfile::tempdir;
    use zip::{ZipWriter, write::SimpleFileOptions};

    use crate::{
        preview::{PREVIEW_ROW_LIMIT, PreviewError},
        table::Row,
        testutil::anyhow_downcasts_to,
    };

    use super::preview_file;

    #[googletest::test]
    fn csv_preview_is_bounded() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("data.csv");
        let mut content = String::from("name,value\n");
        for i in 0..15 {
            writeln!(content, "row{},{}", i, i).expect("should format");
        }
        fs::write(&path, content).expect("should write");

        let preview = preview_file(&path).expect("should preview");

        assert_that!(preview.header, eq(&Row::from(["name", "value"])));
        assert_that!(preview.rows.len(), eq(PREVIEW_ROW_LIMIT));
        assert_that!(preview.rows[0], eq(&Row::from(["row0", "0"])));
        assert_that!(preview.rows[9], eq(&Row::from(["row9", "9"])));
    }

    #[googletest::test]
    fn csv_preview_accepts_short_files() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("short.csv");
        fs::write(&path, "a,b\n1,2\n").expect("should write");

        let preview = preview_file(&path).expect("should preview");

        assert_that!(preview.rows.len(), eq(1));
    }

    #[googletest::test]
    fn empty_csv_is_an_error() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").expect("should write");

        assert_that!(
            preview_file(&path),
            err(anyhow_downcasts_to::<PreviewError, _>(eq(
                &PreviewError::Empty
            ))),
        );
    }

    #[googletest::test]
    fn unsupported_extension_is_an_error() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("data.parquet");
        fs::write(&path, "").expect("should write");

        assert_that!(
            preview_file(&path),
            err(anyhow_downcasts_to::<PreviewError, _>(eq(
                &PreviewError::UnsupportedType {
                    extension: "parquet".to_owned(),
                }
            ))),
        );
    }

    #[googletest::test]
    fn legacy_xls_is_an_error() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("old.xls");
        fs::write(&path, "").expect("should write");

        assert_that!(
            preview_file(&path),
            err(anyhow_downcasts_to::<PreviewError, _>(eq(
                &PreviewError::LegacyXls
            ))),
        );
    }

    fn write_xlsx(path: &Path, shared_strings: Option<&str>, sheet: &str) {
        let mut writer = ZipWriter::new(File::create(path).expect("should create file"));
        if let Some(shared_strings) = shared_strings {
            writer
                .start_file("xl/sharedStrings.xml", SimpleFileOptions::default())
                .expect("should start file");
            writer
                .write_all(shared_strings.as_bytes())
                .expect("should write");
        }
        writer
            .start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
            .expect("should start file");
        writer.write_all(sheet.as_bytes()).expect("should write");
        writer.finish().expect("should finish");
    }

    #[googletest::test]
    fn xlsx_preview_resolves_shared_and_inline_strings() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("book.xlsx");
        write_xlsx(
            &path,
            Some(concat!(
                r#"<?xml version="1.0"?>"#,
                r#"<sst><si><t>name</t></si><si><r><t>va</t></r><r><t>lue</t></r></si></sst>"#,
            )),
            concat!(
                r#"<?xml version="1.0"?>"#,
                r#"<worksheet><sheetData>"#,
                r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#,
                r#"<row r="2"><c r="A2" t="inlineStr"><is><t>first</t></is></c><c r="B2"><v>42</v></c></row>"#,
                r#"</sheetData></worksheet>"#,
            ),
        );

        let preview = preview_file(&path).expect("should preview");

        assert_that!(preview.header, eq(&Row::from(["name", "value"])));
        assert_that!(preview.rows.len(), eq(1));
        assert_that!(preview.rows[0], eq(&Row::from(["first", "42"])));
    }

    #[googletest::test]
    fn xlsx_preview_gap_fills_sparse_rows() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("sparse.xlsx");
        write_xlsx(
            &path,
            None,
            concat!(
                r#"<worksheet><sheetData>"#,
                r#"<row r="1"><c r="A1"><v>h1</v></c><c r="C1"><v>h3</v></c></row>"#,
                r#"<row r="2"><c r="B2"><v>middle</v></c></row>"#,
                r#"</sheetData></worksheet>"#,
            ),
        );

        let preview = preview_file(&path).expect("should preview");

        assert_that!(preview.header, eq(&Row::from(["h1", "", "h3"])));
        assert_that!(preview.rows[0], eq(&Row::from(["", "middle"])));
    }

    #[googletest::test]
    fn xlsx_preview_is_bounded() {
        let dir = tempdir().expect("should create temp dir");
        let path = dir.path().join("long.xlsx");
        let mut sheet = String::from("<worksheet><sheetData>");
        for i in 1..=16 {
            write!(sheet, r#"<row r="{i}"><c><v>cell{i}</v></c></row>"#).expect("should format");
        }
        sheet.push_str("</sheetData></worksheet>");
        write_xlsx(&path, None, &sheet);

        let preview = preview_file(&path).expect("should preview");

        assert_that!(preview.header, eq(&Row::from(["cell1"])));
        assert_that!(preview.rows.len(), eq(PREVIEW_ROW_LIMIT));
    }
}
