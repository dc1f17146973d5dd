use std::collections::BTreeSet;

use crate::classify::classify;
use crate::model::{Article, ArticleStatus};

/// Search box plus the two drop-downs of the article list. Empty fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Case-insensitive substring over REF, description, LOT and category.
    pub query: String,
    pub status: Option<ArticleStatus>,
    pub sparte: Option<String>,
}

impl ArticleFilter {
    pub fn matches(&self, article: &Article) -> bool {
        if let Some(status) = self.status {
            if classify(article) != status {
                return false;
            }
        }

        if let Some(sparte) = &self.sparte {
            if article.sparte != *sparte {
                return false;
            }
        }

        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        [
            &article.materialnummer,
            &article.materialbezeichnung,
            &article.charge,
            &article.sparte,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
    }

    pub fn apply<'a>(&self, articles: &'a [Article]) -> Vec<&'a Article> {
        articles.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Distinct non-empty categories, sorted.
pub fn sparten(articles: &[Article]) -> Vec<String> {
    articles
        .iter()
        .filter(|a| !a.sparte.is_empty())
        .map(|a| a.sparte.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Articles whose effective count differs from the target, in input order.
pub fn deviations(articles: &[Article]) -> Vec<&Article> {
    articles.iter().filter(|a| a.abweichung() != 0).collect()
}
