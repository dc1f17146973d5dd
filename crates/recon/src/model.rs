use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::derived;
use crate::error::ValidationError;

pub type ArticleId = u64;
pub type HistoryId = u64;

/// Largest accepted `soll`, `istScan` or `manuelleZaehlung` value.
pub const MAX_COUNT: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// One line of the target inventory.
///
/// Counting fields are private: every mutation goes through the engine, which
/// re-derives `gueltige_zaehlung`, `abweichung` and `auto_kommentar` before the
/// article is handed back. Identity and free-text columns are plain fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ArticleSnapshot")]
pub struct Article {
    pub id: ArticleId,
    pub sparte: String,
    pub materialnummer: String,
    pub materialbezeichnung: String,
    soll: i64,
    pub charge: String,
    ist_scan: i64,
    manuelle_zaehlung: i64,
    gueltige_zaehlung: i64,
    abweichung: i64,
    pub spalte1: String,
    auto_kommentar: String,
    pub serialnummer: String,
    pub kommentar_sales: String,
    #[serde(rename = "kommentarSCM")]
    pub kommentar_scm: String,
}

/// Identity and source counts of an article as delivered by a bulk importer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub sparte: String,
    pub materialnummer: String,
    pub materialbezeichnung: String,
    pub soll: i64,
    pub charge: String,
    pub manuelle_zaehlung: i64,
    pub spalte1: String,
    pub serialnummer: String,
    pub kommentar_sales: String,
    pub kommentar_scm: String,
}

impl Article {
    /// Build an article from an import row. Scan count starts at zero, the
    /// manual count is carried over from the source.
    pub fn from_import(draft: ArticleDraft) -> Result<Self, ValidationError> {
        check_count("soll", draft.soll)?;
        check_count("manuelleZaehlung", draft.manuelle_zaehlung)?;

        let mut article = Article {
            id: 0,
            sparte: draft.sparte,
            materialnummer: draft.materialnummer,
            materialbezeichnung: draft.materialbezeichnung,
            soll: draft.soll,
            charge: draft.charge,
            ist_scan: 0,
            manuelle_zaehlung: draft.manuelle_zaehlung,
            gueltige_zaehlung: 0,
            abweichung: 0,
            spalte1: draft.spalte1,
            auto_kommentar: String::new(),
            serialnummer: draft.serialnummer,
            kommentar_sales: draft.kommentar_sales,
            kommentar_scm: draft.kommentar_scm,
        };
        article.refresh();
        Ok(article)
    }

    pub fn soll(&self) -> i64 {
        self.soll
    }

    pub fn ist_scan(&self) -> i64 {
        self.ist_scan
    }

    pub fn manuelle_zaehlung(&self) -> i64 {
        self.manuelle_zaehlung
    }

    pub fn gueltige_zaehlung(&self) -> i64 {
        self.gueltige_zaehlung
    }

    pub fn abweichung(&self) -> i64 {
        self.abweichung
    }

    pub fn auto_kommentar(&self) -> &str {
        &self.auto_kommentar
    }

    /// REF column (`materialnummer`).
    pub fn reference(&self) -> &str {
        &self.materialnummer
    }

    /// LOT column (`charge`).
    pub fn lot(&self) -> &str {
        &self.charge
    }

    pub(crate) fn set_ist_scan(&mut self, value: i64) {
        self.ist_scan = value;
        self.refresh();
    }

    pub(crate) fn set_manuelle_zaehlung(&mut self, value: i64) {
        self.manuelle_zaehlung = value;
        self.refresh();
    }

    pub(crate) fn set_soll(&mut self, value: i64) {
        self.soll = value;
        self.refresh();
    }

    /// Re-derive the computed columns from the counting fields.
    pub(crate) fn refresh(&mut self) {
        self.gueltige_zaehlung = self.ist_scan.saturating_add(self.manuelle_zaehlung);
        self.abweichung = self.soll.saturating_sub(self.gueltige_zaehlung);
        self.auto_kommentar = derived::auto_comment(self.gueltige_zaehlung, self.abweichung, self.soll);
    }
}

/// Counts must lie in `0..=MAX_COUNT`.
pub(crate) fn check_count(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeCount { field, value });
    }
    if value > MAX_COUNT {
        return Err(ValidationError::CountTooLarge { field, value });
    }
    Ok(())
}

/// Wire shape of an article. Derived columns are accepted but ignored: they
/// are recomputed on the way in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleSnapshot {
    #[serde(default)]
    id: ArticleId,
    #[serde(default)]
    sparte: String,
    #[serde(default)]
    materialnummer: String,
    #[serde(default)]
    materialbezeichnung: String,
    #[serde(default)]
    soll: i64,
    #[serde(default)]
    charge: String,
    #[serde(default)]
    ist_scan: i64,
    #[serde(default)]
    manuelle_zaehlung: i64,
    #[serde(default)]
    spalte1: String,
    #[serde(default)]
    serialnummer: String,
    #[serde(default)]
    kommentar_sales: String,
    #[serde(default, rename = "kommentarSCM")]
    kommentar_scm: String,
}

impl TryFrom<ArticleSnapshot> for Article {
    type Error = ValidationError;

    fn try_from(snap: ArticleSnapshot) -> Result<Self, Self::Error> {
        check_count("istScan", snap.ist_scan)?;
        let mut article = Article::from_import(ArticleDraft {
            sparte: snap.sparte,
            materialnummer: snap.materialnummer,
            materialbezeichnung: snap.materialbezeichnung,
            soll: snap.soll,
            charge: snap.charge,
            manuelle_zaehlung: snap.manuelle_zaehlung,
            spalte1: snap.spalte1,
            serialnummer: snap.serialnummer,
            kommentar_sales: snap.kommentar_sales,
            kommentar_scm: snap.kommentar_scm,
        })?;
        article.id = snap.id;
        article.set_ist_scan(snap.ist_scan);
        Ok(article)
    }
}

// ---------------------------------------------------------------------------
// Scans
// ---------------------------------------------------------------------------

/// Structured fields of one decoded barcode payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(rename = "ref")]
    pub reference: String,
    pub lot: String,
    pub gtin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    pub raw_data: String,
}

impl ScanResult {
    /// True when at least one of LOT, REF or GTIN was extracted.
    pub fn has_identity(&self) -> bool {
        !self.lot.is_empty() || !self.reference.is_empty() || !self.gtin.is_empty()
    }
}

/// Append-only record of one accepted scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryEntry {
    pub id: HistoryId,
    pub inventory_id: u64,
    pub article_id: ArticleId,
    pub timestamp: DateTime<Utc>,
    pub scan_data: ScanResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryState {
    Valid,
    ExpiresSoon,
    Expired,
}

impl std::fmt::Display for ExpiryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::ExpiresSoon => write!(f, "expires_soon"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Result of applying one scan. The count is always recorded; `overstock` and
/// `expiry` are advisory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    pub article: Article,
    pub entry_id: HistoryId,
    pub overstock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryState>,
}

impl ScanOutcome {
    /// No overstock and no expiry concern.
    pub fn is_clean(&self) -> bool {
        !self.overstock && matches!(self.expiry, None | Some(ExpiryState::Valid))
    }
}

// ---------------------------------------------------------------------------
// Classification + Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Complete,
    Partial,
    Missing,
    Open,
}

impl ArticleStatus {
    pub const ALL: [ArticleStatus; 4] = [Self::Complete, Self::Partial, Self::Missing, Self::Open];

    /// German label used in the inventory sheet.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Complete => "Vollständig",
            Self::Partial => "Teilweise",
            Self::Missing => "Fehlend",
            Self::Open => "Offen",
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Partial => write!(f, "partial"),
            Self::Missing => write!(f, "missing"),
            Self::Open => write!(f, "open"),
        }
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complete" => Ok(Self::Complete),
            "partial" => Ok(Self::Partial),
            "missing" => Ok(Self::Missing),
            "open" => Ok(Self::Open),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub complete: usize,
    pub partial: usize,
    pub missing: usize,
    pub open: usize,
}

impl Statistics {
    /// Share of complete articles, rounded to whole percent.
    pub fn progress_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.complete as f64 / self.total as f64) * 100.0).round() as u32
    }

    /// Articles that still need attention (not yet counted or partially counted).
    pub fn remaining(&self) -> usize {
        self.open + self.partial
    }
}
