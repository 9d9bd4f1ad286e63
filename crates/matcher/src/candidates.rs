use crate::model::{Catalog, CatalogEntry, MatchStatus};
use crate::shade::{extract_leading_number, normalize};

/// Result of narrowing the catalog for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Product lines the oracle may choose from. Never empty.
    Candidates(Vec<String>),
    /// The record was decided without consulting the oracle.
    Early(MatchStatus),
}

/// Narrow a brand's catalog entries to product lines plausibly matching the record.
///
/// A non-empty shade narrows the set to entries carrying that shade. When no
/// entry carries it the shade is treated as unreliable and the whole brand
/// is offered, so a shade typo never starves a record of candidates.
pub fn select_candidates(
    raw_product: &str,
    brand: Option<&str>,
    raw_shade: &str,
    catalog: &Catalog,
) -> Selection {
    let Some(brand) = brand else {
        return Selection::Early(MatchStatus::NoBrand);
    };
    if raw_product.is_empty() {
        return Selection::Early(MatchStatus::EmptyInput);
    }

    let entries: Vec<&CatalogEntry> = catalog.entries_for_brand(brand).collect();
    if entries.is_empty() {
        return Selection::Early(MatchStatus::BrandHasNoProducts);
    }

    if !raw_shade.is_empty() {
        let by_shade = lines_with_shade(&entries, raw_shade);
        if !by_shade.is_empty() {
            return Selection::Candidates(by_shade);
        }
    }

    Selection::Candidates(entries.iter().map(|e| e.product_line.clone()).collect())
}

fn lines_with_shade(entries: &[&CatalogEntry], raw_shade: &str) -> Vec<String> {
    let wanted = normalize(Some(raw_shade));
    let wanted_lower = wanted.to_lowercase();
    let wanted_number = extract_leading_number(&wanted);

    entries
        .iter()
        .filter(|entry| {
            entry.shades.iter().any(|shade| {
                let candidate = normalize(Some(shade));
                if candidate.to_lowercase() == wanted_lower {
                    return true;
                }
                match (&wanted_number, extract_leading_number(&candidate)) {
                    (Some(want), Some(have)) => *want == have,
                    _ => false,
                }
            })
        })
        .map(|entry| entry.product_line.clone())
        .collect()
}
