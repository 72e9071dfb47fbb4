// 📥 Bulk Import / Export - delimited `category|description|amount|date` lines
//
// Import is the only place where errors do not propagate: every line is
// parsed on its own, failures are logged and collected, and the good lines
// come back ready for a batch insert.

use rusqlite::Connection;
use std::io::Write;
use std::path::Path;

use crate::entities::{CategoryRegistry, Record};
use crate::error::{LedgerError, LedgerResult};
use crate::store::peek;

/// Default separator for user-supplied files
pub const DEFAULT_DELIMITER: char = ',';

/// Separator used for backups and ledger-to-ledger transfer
pub const TRANSFER_DELIMITER: char = '|';

/// Header row written at the top of every backup
pub const EXPORT_HEADER: [&str; 4] = ["type", "description", "amount", "date"];

/// A rejected import line
#[derive(Debug)]
pub struct LineFailure {
    /// 1-based line number in the input
    pub line: usize,
    pub content: String,
    pub error: LedgerError,
}

/// Outcome of a batch import: accepted records and rejected lines, in input order
#[derive(Debug, Default)]
pub struct ImportReport {
    pub records: Vec<Record>,
    pub failures: Vec<LineFailure>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse one delimited line into a record
pub fn parse_line(line: &str, registry: &CategoryRegistry, delimiter: char) -> LedgerResult<Record> {
    let fields: Vec<&str> = line.trim().split(delimiter).collect();
    match fields.as_slice() {
        [category, description, amount, date] => {
            Record::parse(category, description, amount, date, registry)
        }
        _ => Err(LedgerError::MalformedLine(fields.len())),
    }
}

/// Parse every line independently, partitioning into records and failures
///
/// Blank lines and a backup header row are skipped without being reported.
pub fn parse_lines<I, S>(lines: I, registry: &CategoryRegistry, delimiter: char) -> ImportReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ImportReport::default();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim();
        if line.is_empty() || is_header(line, delimiter) {
            continue;
        }

        match parse_line(line, registry, delimiter) {
            Ok(record) => report.records.push(record),
            Err(error) => {
                tracing::warn!(line = index + 1, %error, content = line, "skipping import line");
                report.failures.push(LineFailure {
                    line: index + 1,
                    content: line.to_string(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        accepted = report.records.len(),
        rejected = report.failures.len(),
        "parsed import batch"
    );
    report
}

/// Read and parse an import file; only I/O errors propagate
pub fn read_import_file(
    path: &Path,
    registry: &CategoryRegistry,
    delimiter: char,
) -> LedgerResult<ImportReport> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_lines(content.lines(), registry, delimiter))
}

/// Write every record, newest first, as a pipe-delimited backup with header
pub fn write_backup<W: Write>(conn: &Connection, writer: W) -> LedgerResult<usize> {
    let records = peek(conn, None)?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(TRANSFER_DELIMITER as u8)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record(EXPORT_HEADER)?;
    for record in &records {
        let amount = record.amount.to_string();
        let date = record.date_string();
        wtr.write_record([
            record.category.as_str(),
            record.description.as_str(),
            amount.as_str(),
            date.as_str(),
        ])?;
    }
    wtr.flush()?;

    tracing::info!(records = records.len(), "wrote backup");
    Ok(records.len())
}

fn is_header(line: &str, delimiter: char) -> bool {
    line.split(delimiter)
        .map(str::trim)
        .eq(EXPORT_HEADER.iter().copied())
}
