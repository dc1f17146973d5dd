use crate::classify::classify;
use crate::model::{Article, ArticleStatus, Statistics};

/// Fold the article set into per-status counts in a single pass.
pub fn aggregate<'a, I>(articles: I) -> Statistics
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut stats = Statistics::default();

    for article in articles {
        stats.total += 1;
        match classify(article) {
            ArticleStatus::Complete => stats.complete += 1,
            ArticleStatus::Partial => stats.partial += 1,
            ArticleStatus::Missing => stats.missing += 1,
            ArticleStatus::Open => stats.open += 1,
        }
    }

    stats
}
