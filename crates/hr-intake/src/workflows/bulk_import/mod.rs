//! CSV bulk import of applicant drafts.
//!
//! Spreadsheet exports arrive with loosely named headers and mixed value formats. The
//! tokenizer turns the upload into header-keyed rows, and the mapper folds each row onto a
//! baseline draft through the declarative header table in `mapping`.

mod mapper;
mod mapping;
mod normalizer;
mod tokenizer;

pub use mapper::map_row;
pub use mapping::{resolve_header, FieldKind, FieldTarget};
pub use normalizer::{
    canonical_key, header_key, normalize_bool, normalize_date, normalize_list, normalize_phone,
    normalize_restriction_codes, normalize_year, normalize_zip,
};
pub use tokenizer::{tokenize, CsvTable, ImportRow};

use crate::config::ImportLimits;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header row offered to agencies as a starting point for bulk uploads.
pub const TEMPLATE_HEADER: &str = "firstname,lastname,middlename,email,contact,available_start_date,employed,birthday,marital_status,sex,unit_house_number,street,barangay,city,province,zip,education,tertiary_school,tertiary_program,tertiary_year,skills,specialized_training,specialized_year,has_sss,has_pagibig,has_tin,has_philhealth,license_classification,license_expiry,restriction_codes,years_driving,truck_knowledge,vehicles_driven,troubleshooting_tasks,taking_medications,medication_reason,took_medical_test,medical_test_date";

/// Downloadable template body (header row plus trailing newline).
pub fn template_csv() -> String {
    format!("{TEMPLATE_HEADER}\n")
}

#[derive(Debug, thiserror::Error)]
pub enum ImportFormatError {
    #[error("failed to read CSV upload: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("'{file_name}' is not a .csv file")]
    NotCsv { file_name: String },
    #[error("file is {size} bytes; uploads are limited to {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("file contains {rows} applicant rows; at most {limit} can be imported at once")]
    TooManyRows { rows: usize, limit: usize },
    #[error("CSV upload is not valid UTF-8 text")]
    Encoding,
    #[error("CSV needs a header row and at least one applicant row")]
    MissingData,
}

/// Entry point enforcing upload limits before any row is mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkImporter {
    limits: ImportLimits,
}

impl BulkImporter {
    pub fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ImportLimits {
        self.limits
    }

    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> Result<CsvTable, ImportFormatError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.ensure_csv_name(&file_name)?;

        let file = std::fs::File::open(path)?;
        self.load_reader(&file_name, file)
    }

    pub fn load_reader<R: Read>(
        &self,
        file_name: &str,
        reader: R,
    ) -> Result<CsvTable, ImportFormatError> {
        let mut bytes = Vec::new();
        // One byte past the limit is enough to know the upload is too large.
        reader
            .take(self.limits.max_bytes as u64 + 1)
            .read_to_end(&mut bytes)?;
        self.load_bytes(file_name, &bytes)
    }

    pub fn load_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<CsvTable, ImportFormatError> {
        self.ensure_csv_name(file_name)?;
        if bytes.len() > self.limits.max_bytes {
            return Err(ImportFormatError::TooLarge {
                size: bytes.len(),
                limit: self.limits.max_bytes,
            });
        }

        let text = std::str::from_utf8(bytes).map_err(|_| ImportFormatError::Encoding)?;
        let table = tokenize(text)?;
        if table.rows.len() > self.limits.max_rows {
            return Err(ImportFormatError::TooManyRows {
                rows: table.rows.len(),
                limit: self.limits.max_rows,
            });
        }

        info!(
            file_name,
            rows = table.rows.len(),
            columns = table.headers.len(),
            "csv upload accepted"
        );
        for header in &table.headers {
            if resolve_header(header).is_none() {
                debug!(header = header.as_str(), "ignoring unmapped csv column");
            }
        }

        Ok(table)
    }

    fn ensure_csv_name(&self, file_name: &str) -> Result<(), ImportFormatError> {
        let is_csv = Path::new(file_name)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            Ok(())
        } else {
            Err(ImportFormatError::NotCsv {
                file_name: file_name.to_string(),
            })
        }
    }
}
