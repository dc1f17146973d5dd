use crate::model::{Article, ArticleStatus};

/// Classify an article. Evaluated fresh on every call; the first matching
/// row wins:
///
/// | condition                         | status   |
/// |-----------------------------------|----------|
/// | `abweichung == 0 && soll > 0`     | complete |
/// | `ist_scan > 0 && abweichung != 0` | partial  |
/// | `ist_scan == 0 && abweichung > 0` | missing  |
/// | otherwise                         | open     |
pub fn classify(article: &Article) -> ArticleStatus {
    let abweichung = article.abweichung();
    if abweichung == 0 && article.soll() > 0 {
        ArticleStatus::Complete
    } else if article.ist_scan() > 0 && abweichung != 0 {
        ArticleStatus::Partial
    } else if article.ist_scan() == 0 && abweichung > 0 {
        ArticleStatus::Missing
    } else {
        ArticleStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArticleDraft;

    fn article(soll: i64, scans: i64, manual: i64) -> Article {
        let mut a = Article::from_import(ArticleDraft {
            materialnummer: "REF".into(),
            charge: "LOT".into(),
            soll,
            manuelle_zaehlung: manual,
            ..Default::default()
        })
        .unwrap();
        a.set_ist_scan(scans);
        a
    }

    #[test]
    fn complete_when_no_deviation() {
        assert_eq!(classify(&article(3, 3, 0)), ArticleStatus::Complete);
        assert_eq!(classify(&article(3, 1, 2)), ArticleStatus::Complete);
        // manual count alone can complete an article
        assert_eq!(classify(&article(2, 0, 2)), ArticleStatus::Complete);
    }

    #[test]
    fn partial_when_scanned_with_deviation() {
        assert_eq!(classify(&article(3, 1, 0)), ArticleStatus::Partial);
        assert_eq!(classify(&article(1, 3, 0)), ArticleStatus::Partial);
    }

    #[test]
    fn missing_when_unscanned_shortage() {
        assert_eq!(classify(&article(3, 0, 0)), ArticleStatus::Missing);
        assert_eq!(classify(&article(3, 0, 1)), ArticleStatus::Missing);
    }

    #[test]
    fn open_for_zero_target() {
        assert_eq!(classify(&article(0, 0, 0)), ArticleStatus::Open);
        // unscanned overage from manual count only
        assert_eq!(classify(&article(1, 0, 2)), ArticleStatus::Open);
    }

    #[test]
    fn zero_target_scanned_is_partial() {
        // abweichung = -1, ist_scan > 0 → second row
        assert_eq!(classify(&article(0, 1, 0)), ArticleStatus::Partial);
    }
}
