use crate::errors::CoreError;
use crate::models::holding::RawHolding;

use super::{parse_number, ParseReport, RowRejection};

/// Number of columns in a broker CSV export.
pub const CSV_COLUMNS: usize = 11;

/// Column layout of the rows that follow the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// The broker layout: eleven holding fields in fixed order.
    Broker,
    /// This library's own export: a "Returns %" column sits between
    /// returns and XIRR, and "Match Status" trails.
    Export,
}

impl CsvLayout {
    /// The header row is never validated; it is only checked for the
    /// export's "Returns %" column so exported files re-import cleanly.
    pub fn detect(header: &str) -> Self {
        let columns = split_csv_line(header);
        match columns.get(10) {
            Some(col) if col.eq_ignore_ascii_case("Returns %") => CsvLayout::Export,
            _ => CsvLayout::Broker,
        }
    }

    fn xirr_index(&self) -> usize {
        match self {
            CsvLayout::Broker => 10,
            CsvLayout::Export => 11,
        }
    }

    fn min_columns(&self) -> usize {
        self.xirr_index() + 1
    }
}

/// Split one CSV record into trimmed fields.
///
/// Quote characters toggle an "inside quotes" state and are not kept; a
/// comma inside quotes is part of the field. A doubled quote inside a quoted
/// field stands for one literal quote.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Map one data row onto a holding.
pub fn parse_csv_row(fields: &[String], layout: CsvLayout) -> Result<RawHolding, RowRejection> {
    if fields.len() < layout.min_columns() {
        return Err(RowRejection::TooFewColumns {
            expected: layout.min_columns(),
            found: fields.len(),
        });
    }

    let number = |index: usize, column: &str| {
        parse_number(&fields[index]).ok_or_else(|| RowRejection::InvalidNumber {
            column: column.to_string(),
            value: fields[index].clone(),
        })
    };

    let holding = RawHolding {
        scheme_name: fields[0].clone(),
        amc_name: fields[1].clone(),
        category: fields[2].clone(),
        sub_category: fields[3].clone(),
        folio_number: fields[4].clone(),
        source: fields[5].clone(),
        units: number(6, "units")?,
        invested_value: number(7, "invested value")?,
        current_value: number(8, "current value")?,
        returns: number(9, "returns")?,
        xirr: number(layout.xirr_index(), "xirr")?,
    };
    holding
        .validate()
        .map_err(|e| RowRejection::InvalidHolding(e.to_string()))?;
    Ok(holding)
}

/// Group physical lines into CSV records. A quoted field may span lines, so
/// a record continues while its quote count is odd; the line break is kept
/// inside the field. Each record carries the 1-based line it started on.
pub fn csv_records(text: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, line) in text.lines().enumerate() {
        let (start, mut record) = match pending.take() {
            Some((start, mut record)) => {
                record.push('\n');
                (start, record)
            }
            None => (index + 1, String::new()),
        };
        record.push_str(line);
        if record.matches('"').count() % 2 == 0 {
            records.push((start, record));
        } else {
            pending = Some((start, record));
        }
    }
    // An unterminated quote still yields its record so the row is reported.
    if let Some(record) = pending {
        records.push(record);
    }
    records
}

/// Parse a whole CSV document. The first record is the header and is dropped.
/// Blank lines are ignored; every other unreadable row is reported.
pub fn parse_csv(text: &str) -> Result<ParseReport, CoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = csv_records(text).into_iter();
    let (_, header) = records
        .next()
        .ok_or_else(|| CoreError::NoDataFound("the CSV file is empty".into()))?;
    let layout = CsvLayout::detect(&header);

    let mut report = ParseReport::default();
    for (line_number, record) in records {
        if record.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(&record);
        report.push_row(line_number, parse_csv_row(&fields, layout));
    }
    Ok(report)
}
