//! Reconciliation engine.
//!
//! `Inventory` owns the article list and the scan history of one counting
//! session. Callers feed it payloads or manual counts one at a time and
//! persist the returned articles; the engine itself does no IO. Each
//! operation either completes fully (mutation, re-derivation, history) or
//! returns an error with nothing changed.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::aggregate::aggregate;
use crate::classify::classify;
use crate::config::ScanConfig;
use crate::error::{DecodeError, MatchError, ScanError, UndoError, ValidationError};
use crate::expiry;
use crate::gs1;
use crate::matcher::match_article;
use crate::model::{
    check_count, Article, ArticleId, ArticleStatus, ExpiryState, HistoryId, ScanHistoryEntry,
    ScanOutcome, ScanResult, Statistics,
};

/// Free-text columns that `set_comment` may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentField {
    Sales,
    Scm,
    Spalte1,
}

#[derive(Debug, Clone)]
pub struct UndoOutcome {
    pub article: Article,
    pub entry: ScanHistoryEntry,
    /// False when the article had no scans left to take back.
    pub reverted: bool,
}

#[derive(Debug, Clone)]
pub struct Inventory {
    id: u64,
    name: String,
    articles: Vec<Article>,
    /// Oldest first; the last element is the most recent scan.
    history: Vec<ScanHistoryEntry>,
    next_entry_id: HistoryId,
    config: ScanConfig,
}

impl Inventory {
    /// Take ownership of an imported article list. Articles with id `0` get
    /// fresh ids; duplicate ids are rejected.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        articles: Vec<Article>,
    ) -> Result<Self, ValidationError> {
        let articles = assign_ids(articles)?;
        Ok(Self {
            id,
            name: name.into(),
            articles,
            history: Vec::new(),
            next_entry_id: 1,
            config: ScanConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Restore a previously persisted history. Entries are ordered by
    /// timestamp, ties keep their given order.
    pub fn with_history(mut self, mut entries: Vec<ScanHistoryEntry>) -> Self {
        entries.sort_by_key(|e| e.timestamp);
        self.next_entry_id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        self.history = entries;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn article(&self, id: ArticleId) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    pub fn status(&self, id: ArticleId) -> Option<ArticleStatus> {
        self.article(id).map(classify)
    }

    /// History, most recent scan first.
    pub fn history(&self) -> impl Iterator<Item = &ScanHistoryEntry> {
        self.history.iter().rev()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn statistics(&self) -> Statistics {
        aggregate(&self.articles)
    }

    pub fn into_parts(self) -> (Vec<Article>, Vec<ScanHistoryEntry>) {
        (self.articles, self.history)
    }

    /// Replace the whole article list, e.g. after a fresh import. The scan
    /// history refers to the old rows and is dropped with them.
    pub fn replace_articles(&mut self, articles: Vec<Article>) -> Result<(), ValidationError> {
        let articles = assign_ids(articles)?;
        self.articles = articles;
        self.history.clear();
        log::info!("inventory {}: loaded {} articles", self.id, self.articles.len());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Scan pipeline
    // -----------------------------------------------------------------------

    pub fn decode(&self, raw: &str) -> Result<ScanResult, DecodeError> {
        gs1::decode_with(raw, &self.config.decode_options())
    }

    pub fn find(&self, scan: &ScanResult) -> Result<&Article, MatchError> {
        match_article(scan, &self.articles).ok_or_else(|| not_found(scan))
    }

    /// Decode → match → count, stamped with the current time.
    pub fn process_scan(&mut self, raw: &str) -> Result<ScanOutcome, ScanError> {
        self.process_scan_at(raw, Utc::now(), expiry::today())
    }

    pub fn process_scan_at(
        &mut self,
        raw: &str,
        at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<ScanOutcome, ScanError> {
        let scan = self.decode(raw)?;
        let article_id = self.find(&scan)?.id;
        let idx = self.position(article_id).ok_or_else(|| not_found(&scan))?;
        Ok(self.record_scan(idx, scan, at, today))
    }

    /// Count one unit for `article_id`.
    pub fn apply_scan(
        &mut self,
        article_id: ArticleId,
        scan: ScanResult,
    ) -> Result<ScanOutcome, ValidationError> {
        self.apply_scan_at(article_id, scan, Utc::now(), expiry::today())
    }

    pub fn apply_scan_at(
        &mut self,
        article_id: ArticleId,
        scan: ScanResult,
        at: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<ScanOutcome, ValidationError> {
        let idx = self
            .position(article_id)
            .ok_or(ValidationError::UnknownArticle(article_id))?;
        Ok(self.record_scan(idx, scan, at, today))
    }

    /// `idx` is a position in `self.articles` resolved by the caller.
    fn record_scan(
        &mut self,
        idx: usize,
        scan: ScanResult,
        at: DateTime<Utc>,
        today: NaiveDate,
    ) -> ScanOutcome {
        let soon_months = self.config.expiry.soon_months;
        let expiry_state = scan
            .expiry_date
            .map(|date| expiry::classify_expiry(date, today, soon_months));

        // history stays strictly ordered even if the caller's clock stalls
        let timestamp = match self.history.last() {
            Some(last) if at <= last.timestamp => last.timestamp + chrono::Duration::microseconds(1),
            _ => at,
        };

        let article = &mut self.articles[idx];
        let next = article.ist_scan().saturating_add(1);
        article.set_ist_scan(next);
        let updated = article.clone();

        let entry = ScanHistoryEntry {
            id: self.next_entry_id,
            inventory_id: self.id,
            article_id: updated.id,
            timestamp,
            scan_data: scan,
        };
        self.next_entry_id += 1;
        let entry_id = entry.id;
        self.history.push(entry);

        let overstock = updated.gueltige_zaehlung() > updated.soll();
        log::info!(
            "scan {entry_id}: {} / {} now {} of {}",
            updated.materialnummer,
            updated.charge,
            updated.gueltige_zaehlung(),
            updated.soll()
        );
        if overstock {
            log::warn!("article {} exceeds target ({} > {})", updated.id, updated.gueltige_zaehlung(), updated.soll());
        }
        if let Some(state) = expiry_state.filter(|s| *s != ExpiryState::Valid) {
            log::warn!("article {} scanned with expiry state {state}", updated.id);
        }

        ScanOutcome {
            article: updated,
            entry_id,
            overstock,
            expiry: expiry_state,
        }
    }

    // -----------------------------------------------------------------------
    // Manual edits
    // -----------------------------------------------------------------------

    /// Set the manual count to an absolute value. Not a scan event: no
    /// history entry, and undo never touches it.
    pub fn apply_manual(
        &mut self,
        article_id: ArticleId,
        count: i64,
    ) -> Result<&Article, ValidationError> {
        check_count("manuelleZaehlung", count)?;
        let article = self.try_article_mut(article_id)?;
        article.set_manuelle_zaehlung(count);
        Ok(article)
    }

    pub fn set_soll(&mut self, article_id: ArticleId, soll: i64) -> Result<&Article, ValidationError> {
        check_count("soll", soll)?;
        let article = self.try_article_mut(article_id)?;
        article.set_soll(soll);
        Ok(article)
    }

    pub fn set_comment(
        &mut self,
        article_id: ArticleId,
        field: CommentField,
        text: impl Into<String>,
    ) -> Result<&Article, ValidationError> {
        let article = self.try_article_mut(article_id)?;
        let text = text.into();
        match field {
            CommentField::Sales => article.kommentar_sales = text,
            CommentField::Scm => article.kommentar_scm = text,
            CommentField::Spalte1 => article.spalte1 = text,
        }
        Ok(article)
    }

    // -----------------------------------------------------------------------
    // Undo
    // -----------------------------------------------------------------------

    /// Take back the most recent scan. The entry is removed even when the
    /// article has no scans left, in which case the counts stay as they are.
    pub fn undo_last_scan(&mut self) -> Result<UndoOutcome, UndoError> {
        let last = self.history.last().ok_or(UndoError::NoScansToUndo)?;
        let article_id = last.article_id;
        let entry_id = last.id;

        let Some(article) = self.articles.iter_mut().find(|a| a.id == article_id) else {
            return Err(UndoError::ArticleNotFound { entry_id, article_id });
        };

        let reverted = article.ist_scan() > 0;
        if reverted {
            let next = article.ist_scan() - 1;
            article.set_ist_scan(next);
        }
        let article = article.clone();

        let entry = self.history.pop().ok_or(UndoError::NoScansToUndo)?;
        log::info!("undo scan {}: article {} back to {}", entry.id, article.id, article.ist_scan());

        Ok(UndoOutcome { article, entry, reverted })
    }

    fn try_article_mut(&mut self, id: ArticleId) -> Result<&mut Article, ValidationError> {
        self.articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(ValidationError::UnknownArticle(id))
    }

    fn position(&self, id: ArticleId) -> Option<usize> {
        self.articles.iter().position(|a| a.id == id)
    }
}

fn not_found(scan: &ScanResult) -> MatchError {
    MatchError::ArticleNotFound {
        lot: scan.lot.clone(),
        reference: scan.reference.clone(),
    }
}

fn assign_ids(mut articles: Vec<Article>) -> Result<Vec<Article>, ValidationError> {
    let mut seen = HashSet::new();
    for a in articles.iter().filter(|a| a.id != 0) {
        if !seen.insert(a.id) {
            return Err(ValidationError::DuplicateArticleId(a.id));
        }
    }

    let mut next = seen.iter().copied().max().unwrap_or(0) + 1;
    for a in articles.iter_mut().filter(|a| a.id == 0) {
        a.id = next;
        next += 1;
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArticleDraft, MAX_COUNT};
    use chrono::TimeZone;

    fn article(reference: &str, lot: &str, soll: i64) -> Article {
        Article::from_import(ArticleDraft {
            sparte: "Hip".into(),
            materialnummer: reference.into(),
            materialbezeichnung: format!("Implant {reference}"),
            soll,
            charge: lot.into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn inventory() -> Inventory {
        Inventory::new(
            1,
            "Q4 count",
            vec![article("NK100", "L100", 2), article("NK200", "L200", 1), article("NK300", "L300", 0)],
        )
        .unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_790_000_000 + secs, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn scan(lot: &str) -> ScanResult {
        ScanResult {
            lot: lot.into(),
            raw_data: format!("10{lot}"),
            ..Default::default()
        }
    }

    #[test]
    fn assigns_sequential_ids() {
        let inv = inventory();
        let ids: Vec<_> = inv.articles().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn keeps_existing_ids_and_fills_gaps() {
        let mut a = article("A", "LA", 1);
        a.id = 10;
        let inv = Inventory::new(1, "x", vec![a, article("B", "LB", 1)]).unwrap();
        assert_eq!(inv.articles()[0].id, 10);
        assert_eq!(inv.articles()[1].id, 11);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut a = article("A", "LA", 1);
        a.id = 4;
        let b = a.clone();
        let err = Inventory::new(1, "x", vec![a, b]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateArticleId(4));
    }

    #[test]
    fn process_scan_counts_and_records_history() {
        let mut inv = inventory();
        let out = inv.process_scan_at("10L100", at(0), today()).unwrap();
        assert_eq!(out.article.id, 1);
        assert_eq!(out.article.ist_scan(), 1);
        assert_eq!(out.article.gueltige_zaehlung(), 1);
        assert_eq!(out.article.abweichung(), 1);
        assert!(!out.overstock);
        assert_eq!(out.expiry, None);
        assert!(out.is_clean());
        assert_eq!(inv.history_len(), 1);
        assert_eq!(inv.history().next().unwrap().article_id, 1);
        assert_eq!(inv.status(1), Some(ArticleStatus::Partial));
    }

    #[test]
    fn process_scan_matches_by_ref_fallback() {
        let mut inv = inventory();
        let out = inv.process_scan_at("240NK200\u{1d}10UNKNOWN", at(0), today()).unwrap();
        assert_eq!(out.article.id, 2);
        assert_eq!(inv.status(2), Some(ArticleStatus::Complete));
    }

    #[test]
    fn decode_failure_changes_nothing() {
        let mut inv = inventory();
        let err = inv.process_scan_at("garbage", at(0), today()).unwrap_err();
        assert_eq!(err, ScanError::Decode(DecodeError::NoIdentifyingField));
        assert_eq!(inv.history_len(), 0);
    }

    #[test]
    fn unknown_article_changes_nothing() {
        let mut inv = inventory();
        let err = inv.process_scan_at("10NOPE", at(0), today()).unwrap_err();
        assert!(matches!(err, ScanError::Match(MatchError::ArticleNotFound { .. })));
        assert_eq!(inv.history_len(), 0);
        assert!(inv.articles().iter().all(|a| a.ist_scan() == 0));
    }

    #[test]
    fn overstock_is_advisory() {
        let mut inv = inventory();
        inv.apply_scan_at(2, scan("L200"), at(0), today()).unwrap();
        let out = inv.apply_scan_at(2, scan("L200"), at(1), today()).unwrap();
        assert!(out.overstock);
        assert_eq!(out.article.ist_scan(), 2);
        assert_eq!(out.article.abweichung(), -1);
        assert_eq!(out.article.auto_kommentar(), "ÜBERBESTAND: 1 Stück zu viel");
    }

    #[test]
    fn overstock_counts_manual_units() {
        let mut inv = inventory();
        inv.apply_manual(2, 1).unwrap();
        let out = inv.apply_scan_at(2, scan("L200"), at(0), today()).unwrap();
        assert!(out.overstock);
    }

    #[test]
    fn expiry_states_are_reported() {
        let mut inv = inventory();
        let expired = inv.process_scan_at("10L100\u{1d}17250101", at(0), today()).unwrap();
        assert_eq!(expired.expiry, Some(ExpiryState::Expired));
        assert!(!expired.is_clean());
        assert_eq!(expired.article.ist_scan(), 1);

        let soon = inv.process_scan_at("17261201\u{1d}10L100", at(1), today()).unwrap();
        assert_eq!(soon.expiry, Some(ExpiryState::ExpiresSoon));

        let fine = inv.process_scan_at("17301231\u{1d}10L200", at(2), today()).unwrap();
        assert_eq!(fine.expiry, Some(ExpiryState::Valid));
    }

    #[test]
    fn apply_scan_unknown_id() {
        let mut inv = inventory();
        let err = inv.apply_scan_at(99, scan("L100"), at(0), today()).unwrap_err();
        assert_eq!(err, ValidationError::UnknownArticle(99));
        assert_eq!(inv.history_len(), 0);
    }

    #[test]
    fn manual_count_is_absolute_and_not_history() {
        let mut inv = inventory();
        let a = inv.apply_manual(1, 2).unwrap();
        assert_eq!(a.manuelle_zaehlung(), 2);
        assert_eq!(a.gueltige_zaehlung(), 2);
        assert_eq!(a.abweichung(), 0);
        let a = inv.apply_manual(1, 1).unwrap();
        assert_eq!(a.manuelle_zaehlung(), 1);
        assert_eq!(inv.history_len(), 0);
    }

    #[test]
    fn negative_manual_count_rejected() {
        let mut inv = inventory();
        inv.apply_manual(1, 1).unwrap();
        let err = inv.apply_manual(1, -1).unwrap_err();
        assert_eq!(err, ValidationError::NegativeCount { field: "manuelleZaehlung", value: -1 });
        assert_eq!(inv.article(1).unwrap().manuelle_zaehlung(), 1);
    }

    #[test]
    fn oversized_counts_rejected_before_mutation() {
        let mut inv = inventory();
        inv.apply_manual(1, 1).unwrap();

        let err = inv.apply_manual(1, i64::MAX).unwrap_err();
        assert_eq!(
            err,
            ValidationError::CountTooLarge { field: "manuelleZaehlung", value: i64::MAX }
        );
        let err = inv.set_soll(1, MAX_COUNT + 1).unwrap_err();
        assert!(matches!(err, ValidationError::CountTooLarge { field: "soll", .. }));

        let a = inv.article(1).unwrap();
        assert_eq!((a.soll(), a.manuelle_zaehlung()), (2, 1));

        // a scan on top of the largest accepted counts still adds up
        inv.apply_manual(1, MAX_COUNT).unwrap();
        let outcome = inv.process_scan_at("10L100", at(0), today()).unwrap();
        assert_eq!(outcome.article.gueltige_zaehlung(), MAX_COUNT + 1);
        assert!(outcome.overstock);
    }

    #[test]
    fn undo_reverses_last_scan() {
        let mut inv = inventory();
        let before = inv.article(1).unwrap().clone();
        inv.apply_scan_at(1, scan("L100"), at(0), today()).unwrap();
        let undo = inv.undo_last_scan().unwrap();
        assert!(undo.reverted);
        assert_eq!(undo.article, before);
        assert_eq!(undo.entry.article_id, 1);
        assert_eq!(inv.history_len(), 0);
    }

    #[test]
    fn undo_takes_most_recent_first() {
        let mut inv = inventory();
        inv.apply_scan_at(1, scan("L100"), at(0), today()).unwrap();
        inv.apply_scan_at(2, scan("L200"), at(1), today()).unwrap();
        let undo = inv.undo_last_scan().unwrap();
        assert_eq!(undo.article.id, 2);
        assert_eq!(inv.article(1).unwrap().ist_scan(), 1);
        assert_eq!(inv.article(2).unwrap().ist_scan(), 0);
    }

    #[test]
    fn undo_empty_history() {
        let mut inv = inventory();
        assert_eq!(inv.undo_last_scan().unwrap_err(), UndoError::NoScansToUndo);
    }

    #[test]
    fn undo_ignores_manual_edits() {
        let mut inv = inventory();
        inv.apply_scan_at(1, scan("L100"), at(0), today()).unwrap();
        inv.apply_manual(1, 3).unwrap();
        let undo = inv.undo_last_scan().unwrap();
        assert_eq!(undo.article.ist_scan(), 0);
        assert_eq!(undo.article.manuelle_zaehlung(), 3);
        assert_eq!(undo.article.gueltige_zaehlung(), 3);
    }

    #[test]
    fn undo_missing_article_keeps_history() {
        let entry = ScanHistoryEntry {
            id: 5,
            inventory_id: 1,
            article_id: 42,
            timestamp: at(0),
            scan_data: scan("GONE"),
        };
        let mut inv = inventory().with_history(vec![entry]);
        let err = inv.undo_last_scan().unwrap_err();
        assert_eq!(err, UndoError::ArticleNotFound { entry_id: 5, article_id: 42 });
        assert_eq!(inv.history_len(), 1);
    }

    #[test]
    fn undo_at_zero_pops_without_change() {
        let entry = ScanHistoryEntry {
            id: 1,
            inventory_id: 1,
            article_id: 1,
            timestamp: at(0),
            scan_data: scan("L100"),
        };
        let mut inv = inventory().with_history(vec![entry]);
        let undo = inv.undo_last_scan().unwrap();
        assert!(!undo.reverted);
        assert_eq!(undo.article.ist_scan(), 0);
        assert_eq!(inv.history_len(), 0);
    }

    #[test]
    fn restored_history_continues_ids() {
        let entry = ScanHistoryEntry {
            id: 9,
            inventory_id: 1,
            article_id: 1,
            timestamp: at(0),
            scan_data: scan("L100"),
        };
        let mut inv = inventory().with_history(vec![entry]);
        let out = inv.apply_scan_at(1, scan("L100"), at(5), today()).unwrap();
        assert_eq!(out.entry_id, 10);
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut inv = inventory();
        inv.apply_scan_at(1, scan("L100"), at(10), today()).unwrap();
        inv.apply_scan_at(1, scan("L100"), at(10), today()).unwrap();
        inv.apply_scan_at(1, scan("L100"), at(3), today()).unwrap();
        let stamps: Vec<_> = inv.history().map(|e| e.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn set_soll_recomputes() {
        let mut inv = inventory();
        inv.apply_scan_at(3, scan("L300"), at(0), today()).unwrap();
        assert_eq!(inv.status(3), Some(ArticleStatus::Partial));
        let a = inv.set_soll(3, 1).unwrap();
        assert_eq!(a.abweichung(), 0);
        assert_eq!(a.auto_kommentar(), "✓ Vollständig");
        assert!(inv.set_soll(3, -2).is_err());
    }

    #[test]
    fn set_comment_fields() {
        let mut inv = inventory();
        inv.set_comment(1, CommentField::Sales, "call rep").unwrap();
        inv.set_comment(1, CommentField::Scm, "reorder").unwrap();
        inv.set_comment(1, CommentField::Spalte1, "x").unwrap();
        let a = inv.article(1).unwrap();
        assert_eq!(a.kommentar_sales, "call rep");
        assert_eq!(a.kommentar_scm, "reorder");
        assert_eq!(a.spalte1, "x");
        assert_eq!(
            inv.set_comment(77, CommentField::Sales, "?").unwrap_err(),
            ValidationError::UnknownArticle(77)
        );
    }

    #[test]
    fn replace_articles_clears_history() {
        let mut inv = inventory();
        inv.apply_scan_at(1, scan("L100"), at(0), today()).unwrap();
        inv.replace_articles(vec![article("NEW", "LN", 1)]).unwrap();
        assert_eq!(inv.articles().len(), 1);
        assert_eq!(inv.history_len(), 0);
        assert_eq!(inv.undo_last_scan().unwrap_err(), UndoError::NoScansToUndo);
    }

    #[test]
    fn statistics_follow_mutations() {
        let mut inv = inventory();
        let s = inv.statistics();
        assert_eq!((s.total, s.complete, s.partial, s.missing, s.open), (3, 0, 0, 2, 1));
        inv.process_scan_at("10L200", at(0), today()).unwrap();
        inv.process_scan_at("10L100", at(1), today()).unwrap();
        let s = inv.statistics();
        assert_eq!((s.complete, s.partial, s.missing, s.open), (1, 1, 0, 1));
    }
}
