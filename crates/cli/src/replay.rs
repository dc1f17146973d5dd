//! Replays a parsed session file against an inventory.
//!
//! Every line produces one `StepReport`, whether it succeeded or not: a bad
//! read on a real scanner is shown to the operator and counting carries on, so
//! a replay does the same instead of aborting.

use serde::Serialize;

use scancount_recon::expiry;
use scancount_recon::{
    classify, Article, ArticleId, ArticleStatus, ExpiryState, Inventory, ScanOutcome, Statistics,
};

use crate::session::{SessionLine, Step};

/// Overlay texts shown to the operator after a scan.
pub const NOTE_OVERSTOCK: &str = "SOLL überschritten";
pub const NOTE_EXPIRES_SOON: &str = "Läuft bald ab";
pub const NOTE_EXPIRED: &str = "ABGELAUFEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scan,
    Undo,
    Manual,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub line: usize,
    pub action: Action,
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<ArticleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<ExpiryState>,
}

impl StepReport {
    fn failed(line: usize, action: Action, message: String) -> Self {
        Self {
            line,
            action,
            ok: false,
            message,
            article_id: None,
            status: None,
            notes: Vec::new(),
            expiry: None,
        }
    }

    fn done(line: usize, action: Action, article: &Article, message: String) -> Self {
        Self {
            line,
            action,
            ok: true,
            message,
            article_id: Some(article.id),
            status: Some(classify(article)),
            notes: Vec::new(),
            expiry: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub inventory: String,
    pub statistics: Statistics,
    pub progress_percent: u32,
    pub steps: Vec<StepReport>,
    pub deviations: Vec<Article>,
    pub articles: Vec<Article>,
}

impl RunReport {
    pub fn new(inv: &Inventory, steps: Vec<StepReport>) -> Self {
        let statistics = inv.statistics();
        Self {
            inventory: inv.name().to_string(),
            statistics,
            progress_percent: statistics.progress_percent(),
            steps,
            deviations: scancount_recon::deviations(inv.articles()).into_iter().cloned().collect(),
            articles: inv.articles().to_vec(),
        }
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.ok).count()
    }
}

pub fn replay(inv: &mut Inventory, lines: &[SessionLine]) -> Vec<StepReport> {
    lines.iter().map(|l| run_step(inv, l)).collect()
}

fn run_step(inv: &mut Inventory, line: &SessionLine) -> StepReport {
    let n = line.line;
    match &line.step {
        Step::Scan(raw) => match inv.process_scan(raw) {
            Ok(outcome) => {
                let date = inv.history().next().and_then(|e| e.scan_data.expiry_date);
                let text = date.map(|d| expiry::format_with(Some(d), &inv.config().expiry.display_format));
                scan_report(n, &outcome, text)
            }
            Err(e) => StepReport::failed(n, Action::Scan, e.to_string()),
        },
        Step::Undo => match inv.undo_last_scan() {
            Ok(undo) => {
                let message = format!(
                    "undo {} / {}: {} scanned",
                    undo.article.materialnummer,
                    undo.article.charge,
                    undo.article.ist_scan()
                );
                StepReport::done(n, Action::Undo, &undo.article, message)
            }
            Err(e) => StepReport::failed(n, Action::Undo, e.to_string()),
        },
        Step::Manual { lot, count } => {
            let Some(id) = inv.articles().iter().find(|a| a.charge == *lot).map(|a| a.id) else {
                return StepReport::failed(n, Action::Manual, format!("no article with LOT '{lot}'"));
            };
            match inv.apply_manual(id, *count) {
                Ok(article) => {
                    let message = format!(
                        "manual {} / {}: {} of {}",
                        article.materialnummer,
                        article.charge,
                        article.gueltige_zaehlung(),
                        article.soll()
                    );
                    StepReport::done(n, Action::Manual, article, message)
                }
                Err(e) => StepReport::failed(n, Action::Manual, e.to_string()),
            }
        }
    }
}

fn scan_report(line: usize, outcome: &ScanOutcome, expiry_text: Option<String>) -> StepReport {
    let a = &outcome.article;
    let message = format!(
        "{} / {}: {} of {}",
        a.materialnummer,
        a.charge,
        a.gueltige_zaehlung(),
        a.soll()
    );
    let mut report = StepReport::done(line, Action::Scan, a, message);
    report.notes = overlay_notes(outcome, expiry_text.as_deref());
    report.expiry = outcome.expiry;
    report
}

/// Operator-facing warnings for a scan, most urgent first. `expiry_text` is
/// the formatted expiry date, appended to the expiry note when present.
pub fn overlay_notes(outcome: &ScanOutcome, expiry_text: Option<&str>) -> Vec<String> {
    let with_date = |note: &str| match expiry_text {
        Some(date) if !date.is_empty() => format!("{note} {date}"),
        _ => note.to_string(),
    };

    let mut notes = Vec::new();
    if outcome.expiry == Some(ExpiryState::Expired) {
        notes.push(with_date(NOTE_EXPIRED));
    }
    if outcome.overstock {
        notes.push(NOTE_OVERSTOCK.to_string());
    }
    if outcome.expiry == Some(ExpiryState::ExpiresSoon) {
        notes.push(with_date(NOTE_EXPIRES_SOON));
    }
    notes
}

pub fn print_human(report: &RunReport) {
    for step in &report.steps {
        let marker = if step.ok { "ok" } else { "!!" };
        let mut text = format!("line {:>3} {marker} {}", step.line, step.message);
        if let Some(status) = step.status {
            text.push_str(&format!(" ({})", status.label()));
        }
        if !step.notes.is_empty() {
            text.push_str(&format!(" [{}]", step.notes.join(", ")));
        }
        eprintln!("{text}");
    }

    let s = &report.statistics;
    eprintln!(
        "{}: {} articles ({}% complete) - {} complete, {} partial, {} missing, {} open",
        report.inventory,
        s.total,
        report.progress_percent,
        s.complete,
        s.partial,
        s.missing,
        s.open,
    );
    if report.failed_steps() > 0 {
        eprintln!("{} session line(s) could not be applied", report.failed_steps());
    }
}
