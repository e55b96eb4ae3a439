use super::ImportFormatError;
use serde::{Deserialize, Serialize};

/// One data line keyed by its (lowercased) header, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    cells: Vec<(String, String)>,
}

impl ImportRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(header, value)| (header.into(), value.into()))
                .collect(),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(header, value)| (header.as_str(), value.as_str()))
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.as_str())
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
}

pub fn tokenize(text: &str) -> Result<CsvTable, ImportFormatError> {
    let mut lines: Vec<Vec<String>> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push(split_line(line)?);
    }

    if lines.len() < 2 {
        return Err(ImportFormatError::MissingData);
    }

    let mut lines = lines.into_iter();
    let headers = lines.next().map(header_row).unwrap_or_default();

    let rows = lines
        .map(|fields| fit_to_headers(&headers, fields))
        .filter(|row| !row.is_blank())
        .collect();

    Ok(CsvTable { headers, rows })
}

/// Quoting is honored within a single physical line only.
fn split_line(line: &str) -> Result<Vec<String>, ImportFormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

fn header_row(fields: Vec<String>) -> Vec<String> {
    fields
        .into_iter()
        .enumerate()
        .map(|(index, field)| {
            let field = if index == 0 {
                field
                    .strip_prefix('\u{feff}')
                    .map(str::to_string)
                    .unwrap_or(field)
            } else {
                field
            };
            field.trim().to_lowercase()
        })
        .collect()
}

/// Pad short rows; fold surplus columns into the last header so unescaped commas in
/// free text do not shift the remaining cells.
fn fit_to_headers(headers: &[String], mut fields: Vec<String>) -> ImportRow {
    let width = headers.len();
    if fields.len() > width && width > 0 {
        let overflow = fields.split_off(width - 1).join(",");
        fields.push(overflow);
    }
    fields.resize(width, String::new());

    ImportRow::from_pairs(headers.iter().cloned().zip(fields))
}
