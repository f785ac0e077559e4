//! Certification catalog loading.
//!
//! The catalog is a CSV file with a header row followed by rows of
//! `platform, title, code, slug, link`. Only `code` and `slug` drive retrieval.
//! Rows with fewer than four columns, or a blank code or slug, are kept as
//! invalid entries so the caller can warn with their line number and move on.

use std::path::Path;

use crate::Error;
use crate::model::CertificationRecord;

/// Minimum number of columns a catalog row must have.
pub const MIN_COLUMNS: usize = 4;

/// One data row of the catalog, valid or not.
#[derive(Debug)]
pub struct CatalogRow {
    /// 1-based line number in the source file (the header is line 1).
    pub line: usize,
    pub record: Result<CertificationRecord, Error>,
}

/// All data rows of a catalog, in file order.
#[derive(Debug, Default)]
pub struct Catalog {
    pub rows: Vec<CatalogRow>,
}

impl Catalog {
    /// Load a catalog from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::CatalogUnreadable` if the file cannot be opened or its
    /// header cannot be read, and `Error::CatalogEmpty` if there are no data rows.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let unreadable = |reason: String| Error::CatalogUnreadable { path: path.display().to_string(), reason };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| unreadable(e.to_string()))?;

        reader.headers().map_err(|e| unreadable(e.to_string()))?;

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let fallback_line = idx + 2;
            let row = match result {
                Ok(record) => {
                    let line = record.position().map(|p| p.line() as usize).unwrap_or(fallback_line);
                    let fields: Vec<&str> = record.iter().collect();
                    CatalogRow { line, record: parse_row(line, &fields) }
                }
                Err(e) => CatalogRow {
                    line: fallback_line,
                    record: Err(Error::CatalogRowInvalid { line: fallback_line, reason: e.to_string() }),
                },
            };
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(Error::CatalogEmpty(path.display().to_string()));
        }

        tracing::debug!("loaded {} catalog rows from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    /// Number of data rows, valid or not.
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of rows that passed validation.
    pub fn valid_rows(&self) -> usize {
        self.rows.iter().filter(|row| row.record.is_ok()).count()
    }
}

/// Validate one row's fields into a record.
pub fn parse_row(line: usize, fields: &[&str]) -> Result<CertificationRecord, Error> {
    if fields.len() < MIN_COLUMNS {
        return Err(Error::CatalogRowInvalid {
            line,
            reason: format!("expected at least {MIN_COLUMNS} columns, found {}", fields.len()),
        });
    }

    let code = fields[2].trim();
    let slug = fields[3].trim();
    if code.is_empty() {
        return Err(Error::CatalogRowInvalid { line, reason: "certification code is empty".into() });
    }
    if slug.is_empty() {
        return Err(Error::CatalogRowInvalid { line, reason: "certification slug is empty".into() });
    }

    Ok(CertificationRecord {
        platform: fields[0].trim().to_string(),
        title: fields[1].trim().to_string(),
        code: code.to_string(),
        slug: slug.to_string(),
        link: fields.get(4).map(|l| l.trim()).filter(|l| !l.is_empty()).map(str::to_string),
    })
}
