//! Reading prospect rows from uploaded spreadsheets and writing deck links back.
//!
//! Two input families are accepted:
//! - `.csv`, read with the `csv` crate after sniffing the delimiter from the
//!   header line (`,`, `;`, tab or `|`).
//! - `.xlsx` / `.xlsm` / `.xls`, read with `calamine` (first sheet only).
//!
//! Columns are located by header name through a small alias table, so
//! "Company", "Account Name" and "Organization" all feed `company_name`.
//! Columns that match no alias are folded into `extra_context`.
//!
//! The output mirrors the input: every original cell is copied at its original
//! position and four result columns are appended after the last used column.
//! CSV cells are copied verbatim. Any Excel input is written back as `.xlsx`
//! holding the cell values of the first sheet only; formulas, formatting and
//! further sheets are not carried over.

use calamine::{open_workbook_auto, Data, Reader};
use common::jobs::RowResult;
use common::model::prospect::ProspectRow;
use rust_xlsxwriter::Workbook;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RESULT_HEADERS: [&str; 4] = [
    "Gamma Deck URL",
    "Generation Status",
    "PPTX Download URL",
    "Error",
];

const COMPANY_ALIASES: &[&str] = &["company name", "company", "account name", "account", "organization"];
const INDUSTRY_ALIASES: &[&str] = &["industry", "vertical", "sector"];
const WEBSITE_ALIASES: &[&str] = &["website url", "website", "url", "domain", "company url", "web"];
const CONTACT_NAME_ALIASES: &[&str] = &["contact name", "contact", "name", "full name", "first name"];
const CONTACT_TITLE_ALIASES: &[&str] = &["contact title", "title", "job title", "role", "position"];

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("unsupported file type {0:?}; expected .xlsx, .xls, .xlsm or .csv")]
    UnsupportedFormat(String),
    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook has no sheets")]
    NoSheets,
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("the spreadsheet must have a header row and at least one data row")]
    TooFewRows,
    #[error(
        "could not find a 'Company Name' column. Found headers: {found:?}. Expected one of: {expected:?}"
    )]
    MissingCompanyColumn {
        found: Vec<String>,
        expected: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Excel,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Result<Self, SpreadsheetError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" | "xlsm" | "xls" => Ok(SheetFormat::Excel),
            _ => Err(SpreadsheetError::UnsupportedFormat(ext)),
        }
    }

    fn output_extension(self) -> &'static str {
        match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Excel => "xlsx",
        }
    }
}

/// Accepted upload extensions, for validating file names before saving them.
pub fn is_supported_file_name(name: &str) -> bool {
    SheetFormat::from_path(Path::new(name)).is_ok()
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Trimmed value, used for header matching and prospect fields.
    fn text(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            other => other.raw(),
        }
    }

    fn raw(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// The used range of the first sheet, anchored at its position in the sheet.
struct Table {
    format: SheetFormat,
    /// 0-based sheet row of `rows[0]`.
    origin_row: u32,
    /// 0-based sheet column of each row's first cell.
    origin_col: u16,
    rows: Vec<Vec<Cell>>,
    csv_delimiter: u8,
}

impl Table {
    fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 1-based sheet row number of `rows[idx]`.
    fn sheet_row(&self, idx: usize) -> u32 {
        self.origin_row + idx as u32 + 1
    }
}

fn read_table(path: &Path) -> Result<Table, SpreadsheetError> {
    match SheetFormat::from_path(path)? {
        SheetFormat::Csv => read_csv_table(path),
        SheetFormat::Excel => read_excel_table(path),
    }
}

fn read_excel_table(path: &Path) -> Result<Table, SpreadsheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoSheets)??;

    let (origin_row, origin_col) = range.start().unwrap_or((0, 0));
    let rows = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Table {
        format: SheetFormat::Excel,
        origin_row,
        origin_col: origin_col as u16,
        rows,
        csv_delimiter: b',',
    })
}

/// Picks the most frequent candidate delimiter in the header line, defaulting to `,`.
fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .map(|d| (d, header_line.matches(d as char).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn read_csv_table(path: &Path) -> Result<Table, SpreadsheetError> {
    let mut header_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header_line)?;
    let delimiter = detect_delimiter(header_line.trim_start_matches('\u{feff}'));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<Cell> = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let value = if rows.is_empty() && i == 0 {
                    value.trim_start_matches('\u{feff}')
                } else {
                    value
                };
                if value.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(value.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Table {
        format: SheetFormat::Csv,
        origin_row: 0,
        origin_col: 0,
        rows,
        csv_delimiter: delimiter,
    })
}

fn find_column(headers: &[String], aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| !h.is_empty() && aliases.contains(&h.to_lowercase().as_str()))
}

/// Reads every prospect from the first sheet of `path`.
///
/// Rows whose company cell is empty are skipped; they produce no result.
pub fn parse_prospects(path: &Path) -> Result<Vec<ProspectRow>, SpreadsheetError> {
    let table = read_table(path)?;
    prospects_from_table(&table)
}

fn prospects_from_table(table: &Table) -> Result<Vec<ProspectRow>, SpreadsheetError> {
    if table.rows.len() < 2 {
        return Err(SpreadsheetError::TooFewRows);
    }

    let headers: Vec<String> = table.rows[0].iter().map(Cell::text).collect();

    let company_col =
        find_column(&headers, COMPANY_ALIASES).ok_or_else(|| SpreadsheetError::MissingCompanyColumn {
            found: headers.clone(),
            expected: COMPANY_ALIASES,
        })?;
    let industry_col = find_column(&headers, INDUSTRY_ALIASES);
    let website_col = find_column(&headers, WEBSITE_ALIASES);
    let contact_name_col = find_column(&headers, CONTACT_NAME_ALIASES);
    let contact_title_col = find_column(&headers, CONTACT_TITLE_ALIASES);

    let mapped: HashSet<usize> = [
        Some(company_col),
        industry_col,
        website_col,
        contact_name_col,
        contact_title_col,
    ]
    .into_iter()
    .flatten()
    .collect();
    let extra_cols: Vec<usize> = (0..headers.len())
        .filter(|i| !mapped.contains(i) && !headers[*i].is_empty())
        .collect();

    let cell = |row: &[Cell], col: Option<usize>| -> String {
        col.and_then(|c| row.get(c)).map(Cell::text).unwrap_or_default()
    };

    let mut prospects = Vec::new();
    for (idx, row) in table.rows.iter().enumerate().skip(1) {
        let company_name = cell(row, Some(company_col));
        if company_name.is_empty() {
            continue;
        }

        let extra_context = extra_cols
            .iter()
            .filter_map(|&c| {
                let value = cell(row, Some(c));
                (!value.is_empty()).then(|| format!("{}: {}", headers[c], value))
            })
            .collect::<Vec<_>>()
            .join("; ");

        prospects.push(ProspectRow {
            row_index: table.sheet_row(idx),
            company_name,
            industry: cell(row, industry_col),
            website_url: cell(row, website_col),
            contact_name: cell(row, contact_name_col),
            contact_title: cell(row, contact_title_col),
            extra_context,
        });
    }

    Ok(prospects)
}

/// Copies `original` into `output_dir` with the result columns appended.
///
/// Returns the path of the written file, named
/// `{stem}_with_decks_{YYYYmmdd_HHMMSS}.{csv|xlsx}`.
pub fn write_results(
    original: &Path,
    results: &[RowResult],
    output_dir: &Path,
) -> Result<PathBuf, SpreadsheetError> {
    let table = read_table(original)?;
    std::fs::create_dir_all(output_dir)?;

    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("prospects");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let output_path = output_dir.join(format!(
        "{}_with_decks_{}.{}",
        stem,
        timestamp,
        table.format.output_extension()
    ));

    let by_row: HashMap<u32, &RowResult> = results.iter().map(|r| (r.row_index, r)).collect();

    match table.format {
        SheetFormat::Csv => write_csv(&table, &by_row, &output_path)?,
        SheetFormat::Excel => write_xlsx(&table, &by_row, &output_path)?,
    }

    Ok(output_path)
}

fn result_values(result: &RowResult) -> [String; 4] {
    [
        result.deck_url.clone(),
        result.status.as_str().to_string(),
        result.pptx_url.clone(),
        result.error.clone(),
    ]
}

fn write_csv(
    table: &Table,
    by_row: &HashMap<u32, &RowResult>,
    output_path: &Path,
) -> Result<(), SpreadsheetError> {
    let width = table.width();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(table.csv_delimiter)
        .flexible(true)
        .from_path(output_path)?;

    for (idx, row) in table.rows.iter().enumerate() {
        let mut record: Vec<String> = (0..width)
            .map(|c| row.get(c).map(Cell::raw).unwrap_or_default())
            .collect();
        if idx == 0 {
            record.extend(RESULT_HEADERS.iter().map(|h| h.to_string()));
        } else if let Some(result) = by_row.get(&table.sheet_row(idx)) {
            record.extend(result_values(result));
        } else {
            record.extend(std::iter::repeat_n(String::new(), RESULT_HEADERS.len()));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_xlsx(
    table: &Table,
    by_row: &HashMap<u32, &RowResult>,
    output_path: &Path,
) -> Result<(), SpreadsheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let first_result_col = table.origin_col + table.width() as u16;

    for (idx, row) in table.rows.iter().enumerate() {
        let sheet_row = table.origin_row + idx as u32;
        for (c, cell) in row.iter().enumerate() {
            let col = table.origin_col + c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(sheet_row, col, s.as_str())?;
                }
                Cell::Number(n) => {
                    sheet.write_number(sheet_row, col, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(sheet_row, col, *b)?;
                }
            }
        }

        let values: Vec<String> = if idx == 0 {
            RESULT_HEADERS.iter().map(|h| h.to_string()).collect()
        } else if let Some(result) = by_row.get(&table.sheet_row(idx)) {
            result_values(result).to_vec()
        } else {
            continue;
        };
        for (offset, value) in values.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(sheet_row, first_result_col + offset as u16, value.as_str())?;
            }
        }
    }

    workbook.save(output_path)?;
    Ok(())
}
