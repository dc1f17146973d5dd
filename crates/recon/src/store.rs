//! Persistence seams.
//!
//! The engine never talks to storage. Callers load articles through an
//! `ArticleStore`, run them through `Inventory`, and write the returned
//! articles and history entries back. The in-memory stores serve embedding
//! front ends and tests.

use std::collections::BTreeMap;

use crate::error::{StoreError, ValidationError};
use crate::model::{check_count, Article, ArticleId, HistoryId, ScanHistoryEntry};

/// Partial update for `ArticleStore::update`. `None` leaves a column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticlePatch {
    pub soll: Option<i64>,
    pub ist_scan: Option<i64>,
    pub manuelle_zaehlung: Option<i64>,
    pub spalte1: Option<String>,
    pub kommentar_sales: Option<String>,
    pub kommentar_scm: Option<String>,
}

impl ArticlePatch {
    /// Everything the engine may have changed on `article`.
    pub fn from_article(article: &Article) -> Self {
        Self {
            soll: Some(article.soll()),
            ist_scan: Some(article.ist_scan()),
            manuelle_zaehlung: Some(article.manuelle_zaehlung()),
            spalte1: Some(article.spalte1.clone()),
            kommentar_sales: Some(article.kommentar_sales.clone()),
            kommentar_scm: Some(article.kommentar_scm.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `article`, keeping the derived columns consistent. Counts are
    /// checked first; a rejected patch leaves `article` untouched.
    pub fn apply_to(&self, article: &mut Article) -> Result<(), ValidationError> {
        let counts = [
            ("soll", self.soll),
            ("istScan", self.ist_scan),
            ("manuelleZaehlung", self.manuelle_zaehlung),
        ];
        for (field, value) in counts {
            if let Some(v) = value {
                check_count(field, v)?;
            }
        }

        if let Some(v) = self.soll {
            article.set_soll(v);
        }
        if let Some(v) = self.ist_scan {
            article.set_ist_scan(v);
        }
        if let Some(v) = self.manuelle_zaehlung {
            article.set_manuelle_zaehlung(v);
        }
        if let Some(v) = &self.spalte1 {
            article.spalte1 = v.clone();
        }
        if let Some(v) = &self.kommentar_sales {
            article.kommentar_sales = v.clone();
        }
        if let Some(v) = &self.kommentar_scm {
            article.kommentar_scm = v.clone();
        }
        Ok(())
    }
}

pub trait ArticleStore {
    fn load_all(&self) -> Result<Vec<Article>, StoreError>;
    /// Insert or replace; returns the stored id.
    fn save(&mut self, article: Article) -> Result<ArticleId, StoreError>;
    fn update(&mut self, id: ArticleId, patch: &ArticlePatch) -> Result<(), StoreError>;
    fn clear_all(&mut self) -> Result<(), StoreError>;
}

pub trait HistoryStore {
    fn append(&mut self, entry: ScanHistoryEntry) -> Result<HistoryId, StoreError>;
    fn most_recent_first(&self) -> Result<Vec<ScanHistoryEntry>, StoreError>;
    fn remove(&mut self, id: HistoryId) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    rows: BTreeMap<ArticleId, Article>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ArticleStore for MemoryArticleStore {
    fn load_all(&self) -> Result<Vec<Article>, StoreError> {
        Ok(self.rows.values().cloned().collect())
    }

    fn save(&mut self, mut article: Article) -> Result<ArticleId, StoreError> {
        if article.id == 0 {
            article.id = self.rows.keys().next_back().copied().unwrap_or(0) + 1;
        }
        let id = article.id;
        self.rows.insert(id, article);
        Ok(id)
    }

    fn update(&mut self, id: ArticleId, patch: &ArticlePatch) -> Result<(), StoreError> {
        let article = self.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply_to(article)?;
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.rows.clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Vec<ScanHistoryEntry>,
    next_id: HistoryId,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&mut self, mut entry: ScanHistoryEntry) -> Result<HistoryId, StoreError> {
        if entry.id == 0 {
            entry.id = self.next_id.max(1);
        }
        self.next_id = self.next_id.max(entry.id) + 1;
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    fn most_recent_first(&self) -> Result<Vec<ScanHistoryEntry>, StoreError> {
        let mut entries = self.entries.clone();
        // stable: equal timestamps keep reverse insertion order
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    fn remove(&mut self, id: HistoryId) -> Result<(), StoreError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.entries.remove(idx);
        Ok(())
    }
}
