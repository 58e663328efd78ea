//! Minimal quoted-CSV reading and writing.
//!
//! Every table the tool touches (source dump, cache files, error report) has
//! the same shape: UTF-8, comma separated, a mandatory header row, and
//! double-quoted string fields with `""` escaping.  Unquoted fields are
//! accepted on input for hand-edited files.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::errors::SyncError;

/// Quote a single field: wrap in double quotes, double any embedded quote.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Format one row with every field quoted.
pub fn format_row(fields: &[&str]) -> String {
    fields.iter().map(|f| quote(f)).collect::<Vec<_>>().join(",")
}

/// Parse one CSV line into its fields.
pub fn parse_row(line: &str) -> Result<Vec<String>, SyncError> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(c) => field.push(c),
                    None => {
                        return Err(SyncError::Parse(format!(
                            "unterminated quoted field in line: {line}"
                        )))
                    }
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                field.push(c);
                chars.next();
            }
        }
        fields.push(field);
        match chars.next() {
            Some(',') => continue,
            None => return Ok(fields),
            Some(c) => {
                return Err(SyncError::Parse(format!(
                    "unexpected character {c:?} after closing quote in line: {line}"
                )))
            }
        }
    }
}

/// A fully loaded table: header row plus data rows.
#[derive(Debug)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read a whole table.  The header row is mandatory; blank lines are skipped.
pub fn read_table(path: &Path) -> Result<CsvTable, SyncError> {
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let header = match lines.next() {
        Some(line) => parse_row(&line?)?,
        None => {
            return Err(SyncError::Parse(format!(
                "{}: missing header row",
                path.display()
            )))
        }
    };
    let mut rows = Vec::new();
    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(&line)?);
    }
    Ok(CsvTable { header, rows })
}

/// Overwrite `path` with a complete table.
pub fn write_table(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    writeln!(file, "{}", format_row(header))?;
    for row in rows {
        let fields: Vec<&str> = row.iter().map(|s| s.as_str()).collect();
        writeln!(file, "{}", format_row(&fields))?;
    }
    file.sync_data()?;
    Ok(())
}

/// Append-only table writer.  The header is written once when the file is
/// created (or found empty); each appended row is flushed and fsynced before
/// `append` returns, so the caller can treat the record as durable.
pub struct CsvAppender {
    file: File,
}

impl CsvAppender {
    pub fn open(path: &Path, header: &[&str]) -> Result<Self, SyncError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let is_empty = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if is_empty {
            writeln!(file, "{}", format_row(header))?;
            file.sync_data()?;
        }
        Ok(CsvAppender { file })
    }

    pub fn append(&mut self, fields: &[&str]) -> Result<(), SyncError> {
        writeln!(self.file, "{}", format_row(fields))?;
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}
