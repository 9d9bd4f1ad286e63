// Property-based tests for key derivation, shade handling and candidate selection.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use prodmatch_matcher::candidates::{select_candidates, Selection};
use prodmatch_matcher::shade::{extract_leading_number, normalize};
use prodmatch_matcher::{Catalog, CatalogEntry, RawRecord};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn arb_field() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => r"[a-zA-Z0-9 .#]{0,12}",
        1 => Just(String::new()),
    ]
}

fn arb_shade() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => r"(No\. |#)?[0-9]{1,3}( [A-Z][a-z]{2,6})?",
        1 => r"[A-Z][a-z]{2,8}",
        1 => Just(String::new()),
    ]
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn equal_fields_give_equal_keys(
        video in arb_field(),
        brand in arb_field(),
        product in arb_field(),
        shade in arb_field(),
        upstream_a in proptest::option::of(arb_field()),
        upstream_b in proptest::option::of(arb_field()),
    ) {
        let a = RawRecord {
            video_id: video.clone(),
            brand_raw: brand.clone(),
            product_line_raw: product.clone(),
            shade_raw: shade.clone(),
            brand_standardized: upstream_a,
            extra: Default::default(),
        };
        let b = RawRecord {
            video_id: video,
            brand_raw: brand,
            product_line_raw: product,
            shade_raw: shade,
            brand_standardized: upstream_b,
            extra: Default::default(),
        };
        prop_assert_eq!(a.key(), b.key());
    }

    #[test]
    fn normalize_is_idempotent(shade in arb_shade()) {
        let once = normalize(Some(&shade));
        prop_assert_eq!(normalize(Some(&once)), once.clone());
        prop_assert!(!once.contains('#'));
        prop_assert_eq!(once.trim(), once.as_str());
    }

    #[test]
    fn leading_number_is_a_prefix(shade in arb_shade()) {
        let norm = normalize(Some(&shade));
        if let Some(n) = extract_leading_number(&norm) {
            prop_assert!(norm.starts_with(&n));
            prop_assert!(n.chars().next().unwrap().is_ascii_digit());
        }
    }

    #[test]
    fn shade_never_empties_candidates(
        shades in proptest::collection::vec(proptest::collection::vec(arb_shade(), 0..4), 1..5),
        raw_shade in arb_shade(),
    ) {
        let catalog = Catalog {
            products: shades
                .into_iter()
                .enumerate()
                .map(|(i, shades)| CatalogEntry {
                    brand: "Brand".into(),
                    product_line: format!("Line {i}"),
                    shades,
                })
                .collect(),
        };
        match select_candidates("product", Some("Brand"), &raw_shade, &catalog) {
            Selection::Candidates(c) => {
                prop_assert!(!c.is_empty());
                prop_assert!(c.len() <= catalog.products.len());
            }
            Selection::Early(s) => prop_assert!(false, "unexpected early status {}", s),
        }
    }
}
