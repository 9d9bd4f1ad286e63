use serde::{Deserialize, Deserializer, Serialize};

use crate::key::RecordKey;

/// Confidence assigned to an oracle answer that passed validation.
pub const SUCCESS_SCORE: u32 = 90;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One raw (brand, product line, shade) observation tied to a source video.
///
/// Legacy upstream exports name the fields `canonical_video_id`,
/// `brand_raw_examples`, etc.; both spellings are accepted. Fields this
/// stage does not know about are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "canonical_video_id", deserialize_with = "null_as_empty")]
    pub video_id: String,
    #[serde(default, alias = "brand_raw_examples", deserialize_with = "null_as_empty")]
    pub brand_raw: String,
    #[serde(default, alias = "product_line_raw_examples", deserialize_with = "null_as_empty")]
    pub product_line_raw: String,
    #[serde(default, alias = "shade_raw_examples", deserialize_with = "null_as_empty")]
    pub shade_raw: String,
    /// Canonical brand chosen by the brand-standardization stage.
    #[serde(default)]
    pub brand_standardized: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::of(self)
    }

    /// Standardized brand, treating an empty string as absent.
    pub fn brand(&self) -> Option<&str> {
        self.brand_standardized.as_deref().filter(|b| !b.is_empty())
    }

    pub fn product(&self) -> &str {
        self.product_line_raw.trim()
    }

    pub fn shade(&self) -> &str {
        self.shade_raw.trim()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub brand: String,
    pub product_line: String,
    #[serde(default)]
    pub shades: Vec<String>,
}

/// Canonical reference of valid (brand, product line, shade) combinations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<CatalogEntry>,
}

impl Catalog {
    /// Entries whose brand equals `brand` exactly (case-sensitive), in catalog order.
    pub fn entries_for_brand<'a>(&'a self, brand: &'a str) -> impl Iterator<Item = &'a CatalogEntry> + 'a {
        self.products.iter().filter(move |p| p.brand == brand)
    }
}

// ---------------------------------------------------------------------------
// Match outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NoBrand,
    EmptyInput,
    BrandHasNoProducts,
    AiReturnedNone,
    AiHallucinated,
    Success,
    ApiError,
    Exception,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoBrand => "no_brand",
            Self::EmptyInput => "empty_input",
            Self::BrandHasNoProducts => "brand_has_no_products",
            Self::AiReturnedNone => "ai_returned_none",
            Self::AiHallucinated => "ai_hallucinated",
            Self::Success => "success",
            Self::ApiError => "api_error",
            Self::Exception => "exception",
        }
    }

    /// True when reaching this status required a round-trip to the oracle.
    pub fn consulted_oracle(&self) -> bool {
        matches!(
            self,
            Self::AiReturnedNone | Self::AiHallucinated | Self::Success | Self::ApiError | Self::Exception
        )
    }

    /// Transport-level failures, as opposed to classification outcomes.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::ApiError | Self::Exception)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched_line: Option<String>,
    pub score: u32,
    pub status: MatchStatus,
}

impl MatchOutcome {
    pub fn matched(line: String) -> Self {
        Self { matched_line: Some(line), score: SUCCESS_SCORE, status: MatchStatus::Success }
    }

    pub fn unmatched(status: MatchStatus) -> Self {
        Self { matched_line: None, score: 0, status }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A raw record plus its product-line decision. Written once per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: RawRecord,
    pub product_line_standardized: Option<String>,
    pub product_standardized_score: u32,
    pub product_match_status: MatchStatus,
}

impl AnnotatedRecord {
    pub fn new(record: RawRecord, outcome: MatchOutcome) -> Self {
        Self {
            record,
            product_line_standardized: outcome.matched_line,
            product_standardized_score: outcome.score,
            product_match_status: outcome.status,
        }
    }

    pub fn key(&self) -> RecordKey {
        self.record.key()
    }

    pub fn is_resolved(&self) -> bool {
        self.product_line_standardized.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// One row of the unresolved-record report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonMatchEntry {
    pub brand: String,
    pub product_raw: String,
    pub shade_raw: String,
    pub reason: MatchStatus,
    pub count: usize,
    /// Always null here; filled in by the manual-correction pass.
    pub product_line_standardized: Option<String>,
}
