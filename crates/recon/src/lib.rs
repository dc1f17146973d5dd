//! `scancount-recon`: GS1 scan decoding and inventory reconciliation.
//!
//! Pure engine crate: decodes raw barcode payloads, matches them against a
//! pre-loaded article list, keeps counts and scan history consistent, and
//! classifies the result. No CLI or IO dependencies; persistence goes through
//! the traits in [`store`].

pub mod aggregate;
pub mod ai;
pub mod classify;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod expiry;
pub mod filter;
pub mod gate;
pub mod gs1;
pub mod matcher;
pub mod model;
pub mod store;

pub use aggregate::aggregate;
pub use classify::classify;
pub use config::ScanConfig;
pub use engine::{CommentField, Inventory, UndoOutcome};
pub use error::{DecodeError, MatchError, ScanError, StoreError, UndoError, ValidationError};
pub use filter::{deviations, sparten, ArticleFilter};
pub use gate::{GateBusy, ScanGate};
pub use gs1::{decode, decode_with, DecodeOptions};
pub use matcher::match_article;
pub use model::{
    Article, ArticleDraft, ArticleId, ArticleStatus, ExpiryState, HistoryId, ScanHistoryEntry,
    ScanOutcome, ScanResult, Statistics, MAX_COUNT,
};
