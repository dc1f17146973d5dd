//! Article list import from the inventory sheet exported as CSV.
//!
//! Columns are positional (A–N of the sheet), the first row is a header and
//! is skipped. Rows without a REF (column B) are ignored. Derived columns
//! (F, H, I, K) are read past: scan counts start at zero and everything else
//! is recomputed.

use std::fmt;
use std::io;
use std::path::Path;

use scancount_recon::{Article, ArticleDraft, ValidationError};

const COL_SPARTE: usize = 0;
const COL_MATERIALNUMMER: usize = 1;
const COL_MATERIALBEZEICHNUNG: usize = 2;
const COL_SOLL: usize = 3;
const COL_CHARGE: usize = 4;
const COL_MANUELLE_ZAEHLUNG: usize = 6;
const COL_SPALTE1: usize = 9;
const COL_SERIALNUMMER: usize = 11;
const COL_KOMMENTAR_SALES: usize = 12;
const COL_KOMMENTAR_SCM: usize = 13;

#[derive(Debug)]
pub enum ImportError {
    Io(String),
    Csv { row: usize, message: String },
    Count { row: usize, column: char, value: String },
    Invalid { row: usize, source: ValidationError },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(msg) => write!(f, "{msg}"),
            ImportError::Csv { row, message } => write!(f, "row {row}: {message}"),
            ImportError::Count { row, column, value } => {
                write!(f, "row {row}, column {column}: '{value}' is not a valid count")
            }
            ImportError::Invalid { row, source } => write!(f, "row {row}: {source}"),
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Debug)]
pub struct ImportReport {
    pub articles: Vec<Article>,
    /// Data rows dropped for lacking a REF.
    pub skipped: usize,
}

pub fn read_articles(path: &Path, delimiter: u8) -> Result<ImportReport, ImportError> {
    let file = std::fs::File::open(path)
        .map_err(|e| ImportError::Io(format!("cannot read {}: {e}", path.display())))?;
    parse_articles(file, delimiter)
}

pub fn parse_articles<R: io::Read>(reader: R, delimiter: u8) -> Result<ImportReport, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut articles = Vec::new();
    let mut skipped = 0;

    for (idx, record) in rdr.records().enumerate() {
        // sheet row number: header is row 1
        let row = idx + 2;
        let record = record.map_err(|e| ImportError::Csv { row, message: e.to_string() })?;
        let cell = |col: usize| record.get(col).unwrap_or("").trim().to_string();

        if cell(COL_MATERIALNUMMER).is_empty() {
            skipped += 1;
            continue;
        }

        let draft = ArticleDraft {
            sparte: cell(COL_SPARTE),
            materialnummer: cell(COL_MATERIALNUMMER),
            materialbezeichnung: cell(COL_MATERIALBEZEICHNUNG),
            soll: parse_count(&cell(COL_SOLL), row, 'D')?,
            charge: cell(COL_CHARGE),
            manuelle_zaehlung: parse_count(&cell(COL_MANUELLE_ZAEHLUNG), row, 'G')?,
            spalte1: cell(COL_SPALTE1),
            serialnummer: cell(COL_SERIALNUMMER),
            kommentar_sales: cell(COL_KOMMENTAR_SALES),
            kommentar_scm: cell(COL_KOMMENTAR_SCM),
        };

        let article =
            Article::from_import(draft).map_err(|source| ImportError::Invalid { row, source })?;
        articles.push(article);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "rows without REF ignored");
    }

    Ok(ImportReport { articles, skipped })
}

/// Empty cells count as zero. Spreadsheet exports may write `3.0` or `3,0`.
/// Whole numbers outside the `i64` range are rejected here; the article
/// constructor enforces the tighter count bounds.
fn parse_count(value: &str, row: usize, column: char) -> Result<i64, ImportError> {
    if value.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    // 2^63 is the first float past i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    match value.replace(',', ".").parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (-LIMIT..LIMIT).contains(&f) => Ok(f as i64),
        _ => Err(ImportError::Count { row, column, value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Sparte,Materialnummer,Materialbezeichnung,Soll,Charge,IST Scan,Manuelle Zählung,Gültige Zählung,Abweichung,Spalte1,Auto-Kommentar,Serialnummer,Kommentar Sales,Kommentar SCM\n";

    fn parse(body: &str) -> Result<ImportReport, ImportError> {
        parse_articles(format!("{HEADER}{body}").as_bytes(), b',')
    }

    #[test]
    fn reads_positional_columns() {
        let report = parse("Knie,NK1,Femur,3,L1,9,1,99,99,Kons,stale,SN1,sales,scm\n").unwrap();
        assert_eq!(report.skipped, 0);
        let a = &report.articles[0];
        assert_eq!(a.sparte, "Knie");
        assert_eq!(a.materialnummer, "NK1");
        assert_eq!(a.charge, "L1");
        assert_eq!(a.soll(), 3);
        // column F is ignored on import
        assert_eq!(a.ist_scan(), 0);
        assert_eq!(a.manuelle_zaehlung(), 1);
        assert_eq!(a.abweichung(), 2);
        assert_eq!(a.spalte1, "Kons");
        assert_eq!(a.auto_kommentar(), "FEHLBESTAND: 2 Stück fehlen");
        assert_eq!(a.serialnummer, "SN1");
        assert_eq!(a.kommentar_sales, "sales");
        assert_eq!(a.kommentar_scm, "scm");
    }

    #[test]
    fn short_rows_and_missing_ref() {
        let report = parse("Knie,NK1,Femur,1,L1\n,,,,\nHüfte,,Kopf,2,L2\n").unwrap();
        assert_eq!(report.articles.len(), 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.articles[0].manuelle_zaehlung(), 0);
    }

    #[test]
    fn spreadsheet_number_forms() {
        let report = parse("K,A,x,2.0,L\nK,B,x,\"4,0\",L\nK,C,x,,L\n").unwrap();
        let solls: Vec<_> = report.articles.iter().map(|a| a.soll()).collect();
        assert_eq!(solls, vec![2, 4, 0]);
    }

    #[test]
    fn fractional_count_rejected() {
        let err = parse("K,A,x,1.5,L\n").unwrap_err();
        assert!(matches!(err, ImportError::Count { row: 2, column: 'D', .. }));
    }

    #[test]
    fn huge_counts_rejected() {
        let err = parse("K,A,x,1,L1,,1e30\n").unwrap_err();
        assert!(matches!(err, ImportError::Count { row: 2, column: 'G', .. }));
        assert!(err.to_string().contains("'1e30' is not a valid count"));

        let err = parse("K,A,x,1e12,L1\n").unwrap_err();
        assert!(matches!(
            err,
            ImportError::Invalid { row: 2, source: ValidationError::CountTooLarge { field: "soll", .. } }
        ));
        assert!(parse("K,A,x,99999999999999999999,L1\n").is_err());
    }

    #[test]
    fn negative_count_rejected() {
        let err = parse("K,A,x,1,L,,-2\n").unwrap_err();
        assert!(err.to_string().starts_with("row 2:"));
        assert!(matches!(err, ImportError::Invalid { row: 2, .. }));
    }

    #[test]
    fn semicolon_delimiter() {
        let csv = "Sparte;Materialnummer;Bez;Soll;Charge\nKnie;NK1;Femur;2;L1\n";
        let report = parse_articles(csv.as_bytes(), b';').unwrap();
        assert_eq!(report.articles[0].soll(), 2);
    }
}
