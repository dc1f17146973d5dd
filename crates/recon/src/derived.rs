//! Derived columns. Computed from the counting fields, never set by hand.

use crate::model::Article;

/// Annotation for the current deviation. At most one clause applies.
pub fn auto_comment(gueltige_zaehlung: i64, abweichung: i64, soll: i64) -> String {
    if abweichung > 0 {
        format!("FEHLBESTAND: {abweichung} Stück fehlen")
    } else if abweichung < 0 {
        format!("ÜBERBESTAND: {} Stück zu viel", abweichung.abs())
    } else if gueltige_zaehlung == soll && soll > 0 {
        "✓ Vollständig".to_string()
    } else {
        String::new()
    }
}

/// Return a copy of `article` with `gueltige_zaehlung`, `abweichung` and
/// `auto_kommentar` re-derived from `ist_scan`, `manuelle_zaehlung` and `soll`.
pub fn recompute(article: &Article) -> Article {
    let mut next = article.clone();
    next.refresh();
    next
}
