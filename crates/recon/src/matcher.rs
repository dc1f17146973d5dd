use crate::model::{Article, ScanResult};

/// Resolve a decoded scan to an inventory row.
///
/// LOT is tried first: it identifies a physical batch, whereas one REF may
/// cover many rows. REF is the fallback. Empty identifiers never match.
pub fn match_article<'a>(scan: &ScanResult, articles: &'a [Article]) -> Option<&'a Article> {
    if !scan.lot.is_empty() {
        if let Some(hit) = articles.iter().find(|a| a.charge == scan.lot) {
            return Some(hit);
        }
    }

    if !scan.reference.is_empty() {
        if let Some(hit) = articles.iter().find(|a| a.materialnummer == scan.reference) {
            return Some(hit);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArticleDraft;

    fn article(id: u64, reference: &str, lot: &str) -> Article {
        let mut a = Article::from_import(ArticleDraft {
            materialnummer: reference.into(),
            charge: lot.into(),
            soll: 1,
            ..Default::default()
        })
        .unwrap();
        a.id = id;
        a
    }

    fn scan(reference: &str, lot: &str) -> ScanResult {
        ScanResult {
            reference: reference.into(),
            lot: lot.into(),
            raw_data: format!("{reference}{lot}"),
            ..Default::default()
        }
    }

    #[test]
    fn lot_wins_over_ref() {
        let articles = vec![article(1, "NK100", "X1"), article(2, "NK200", "L42")];
        // REF points at row 1, LOT at row 2
        let hit = match_article(&scan("NK100", "L42"), &articles).unwrap();
        assert_eq!(hit.id, 2);
    }

    #[test]
    fn falls_back_to_ref() {
        let articles = vec![article(1, "NK100", "X1"), article(2, "NK200", "L42")];
        let hit = match_article(&scan("NK200", "UNKNOWN"), &articles).unwrap();
        assert_eq!(hit.id, 2);
    }

    #[test]
    fn first_row_wins_on_duplicate_lot() {
        let articles = vec![article(1, "A", "L1"), article(2, "B", "L1")];
        assert_eq!(match_article(&scan("", "L1"), &articles).unwrap().id, 1);
    }

    #[test]
    fn empty_identifiers_never_match() {
        let articles = vec![article(1, "", "")];
        assert!(match_article(&scan("", ""), &articles).is_none());
    }

    #[test]
    fn no_match() {
        let articles = vec![article(1, "NK100", "X1")];
        assert!(match_article(&scan("NK999", "Z9"), &articles).is_none());
    }
}
