//! Oracle boundary.
//!
//! The oracle is any text classifier that, given a raw product name and a
//! closed list of canonical product lines, answers with one list entry or
//! the sentinel [`NONE_SENTINEL`]. [`MatchAdapter`] owns the contract:
//! it builds the request, rejects answers outside the list, and never lets
//! an oracle failure escape as an error.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::candidates::{select_candidates, Selection};
use crate::model::{Catalog, MatchOutcome, MatchStatus};

/// Literal answer meaning "no reasonable match in the list".
pub const NONE_SENTINEL: &str = "NONE";

/// A classification request: one raw product name against a closed candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    pub raw_product: String,
    pub brand: String,
    pub candidates: Vec<String>,
}

impl OracleRequest {
    /// Prompt text sent to language-model oracles.
    pub fn prompt(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You are matching beauty product names. Given a raw product name, \
             pick the product it refers to from the catalog list below.\n\n",
        );
        prompt.push_str(&format!("Raw product: \"{}\"\n", self.raw_product));
        prompt.push_str(&format!("Brand: \"{}\"\n\n", self.brand));

        prompt.push_str("Catalog products (case-sensitive, exact spelling):\n");
        prompt.push_str(&self.candidates.join("\n"));
        prompt.push_str("\n\n");

        prompt.push_str(
            "Rules:\n\
             - Shortened or informal names match the full catalog name (\"yummy skin\" -> \"Yummy Skin Soothing Serum Skin Tint Foundation\")\n\
             - Focus on the key identifying words, not marketing filler\n\
             - Copy the chosen product EXACTLY as written in the list\n",
        );
        prompt.push_str(&format!(
            "- Answer {NONE_SENTINEL} only if no listed product is a reasonable match\n\n"
        ));
        prompt.push_str(&format!(
            "Answer with just the exact product name or {NONE_SENTINEL}:"
        ));

        prompt
    }
}

/// Failure talking to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// Connection, DNS, TLS or timeout failure.
    Network(String),
    /// Non-success HTTP response.
    Http { status: u16, message: String },
    /// A response arrived but could not be interpreted.
    InvalidResponse(String),
}

impl OracleError {
    /// Status recorded on the record when this error ends a classification.
    pub fn status(&self) -> MatchStatus {
        match self {
            Self::Network(_) | Self::Http { .. } => MatchStatus::ApiError,
            Self::InvalidResponse(_) => MatchStatus::Exception,
        }
    }
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// External text classifier.
pub trait Oracle {
    /// Return the raw single-line answer for `request`.
    fn classify(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

impl<T: Oracle + ?Sized> Oracle for &T {
    fn classify(&self, request: &OracleRequest) -> Result<String, OracleError> {
        (**self).classify(request)
    }
}

impl<T: Oracle + ?Sized> Oracle for Box<T> {
    fn classify(&self, request: &OracleRequest) -> Result<String, OracleError> {
        (**self).classify(request)
    }
}

/// Enforces the closed-vocabulary contract around an [`Oracle`].
pub struct MatchAdapter<'a> {
    oracle: &'a dyn Oracle,
    pause: Duration,
}

impl<'a> MatchAdapter<'a> {
    /// `pause` is slept after every oracle call to stay under provider quotas.
    pub fn new(oracle: &'a dyn Oracle, pause: Duration) -> Self {
        Self { oracle, pause }
    }

    /// Match one raw product to a canonical product line.
    pub fn match_product(
        &self,
        raw_product: &str,
        brand: Option<&str>,
        raw_shade: &str,
        catalog: &Catalog,
    ) -> MatchOutcome {
        let candidates = match select_candidates(raw_product, brand, raw_shade, catalog) {
            Selection::Candidates(c) => c,
            Selection::Early(status) => return MatchOutcome::unmatched(status),
        };

        let request = OracleRequest {
            raw_product: raw_product.to_string(),
            brand: brand.unwrap_or_default().to_string(),
            candidates,
        };

        let answer = self.oracle.classify(&request);
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }

        match answer {
            Ok(text) => validate_answer(text.trim(), &request.candidates),
            Err(e) => {
                log::warn!("oracle error for product '{raw_product}': {e}");
                MatchOutcome::unmatched(e.status())
            }
        }
    }
}

/// Accept `answer` only if it is one of `candidates` verbatim.
pub fn validate_answer(answer: &str, candidates: &[String]) -> MatchOutcome {
    if answer == NONE_SENTINEL {
        return MatchOutcome::unmatched(MatchStatus::AiReturnedNone);
    }
    if !candidates.iter().any(|c| c == answer) {
        log::debug!("rejected answer outside candidate list: {answer:?}");
        return MatchOutcome::unmatched(MatchStatus::AiHallucinated);
    }
    MatchOutcome::matched(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatalogEntry, SUCCESS_SCORE};
    use std::cell::RefCell;

    /// Replays a fixed answer and records every request it sees.
    struct Scripted {
        answer: Result<String, OracleError>,
        seen: RefCell<Vec<OracleRequest>>,
    }

    impl Scripted {
        fn answering(answer: &str) -> Self {
            Self { answer: Ok(answer.to_string()), seen: RefCell::new(Vec::new()) }
        }

        fn failing(err: OracleError) -> Self {
            Self { answer: Err(err), seen: RefCell::new(Vec::new()) }
        }
    }

    impl Oracle for Scripted {
        fn classify(&self, request: &OracleRequest) -> Result<String, OracleError> {
            self.seen.borrow_mut().push(request.clone());
            self.answer.clone()
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            products: vec![
                CatalogEntry {
                    brand: "Maybelline".into(),
                    product_line: "Fit Me Matte Foundation".into(),
                    shades: vec!["128 Warm Nude".into()],
                },
                CatalogEntry {
                    brand: "Maybelline".into(),
                    product_line: "Sky High Mascara".into(),
                    shades: vec![],
                },
            ],
        }
    }

    #[test]
    fn success_requires_verbatim_candidate() {
        let oracle = Scripted::answering("  Fit Me Matte Foundation\n");
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Fit Me", Some("Maybelline"), "128", &catalog());
        assert_eq!(out.status, MatchStatus::Success);
        assert_eq!(out.score, SUCCESS_SCORE);
        assert_eq!(out.matched_line.as_deref(), Some("Fit Me Matte Foundation"));

        let seen = oracle.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].candidates, vec!["Fit Me Matte Foundation"]);
    }

    #[test]
    fn hallucination_rejected() {
        let oracle = Scripted::answering("Fit Me Matte + Poreless Foundation");
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Fit Me", Some("Maybelline"), "", &catalog());
        assert_eq!(out, MatchOutcome::unmatched(MatchStatus::AiHallucinated));
    }

    #[test]
    fn case_variant_is_hallucination() {
        let out = validate_answer("sky high mascara", &["Sky High Mascara".to_string()]);
        assert_eq!(out.status, MatchStatus::AiHallucinated);
        assert_eq!(out.score, 0);
    }

    #[test]
    fn none_sentinel() {
        let oracle = Scripted::answering("NONE");
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Lash Sensational", Some("Maybelline"), "", &catalog());
        assert_eq!(out, MatchOutcome::unmatched(MatchStatus::AiReturnedNone));
    }

    #[test]
    fn transport_failures_become_statuses() {
        let oracle = Scripted::failing(OracleError::Network("connection reset".into()));
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Fit Me", Some("Maybelline"), "", &catalog());
        assert_eq!(out, MatchOutcome::unmatched(MatchStatus::ApiError));

        let oracle = Scripted::failing(OracleError::Http { status: 429, message: "slow down".into() });
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Fit Me", Some("Maybelline"), "", &catalog());
        assert_eq!(out.status, MatchStatus::ApiError);

        let oracle = Scripted::failing(OracleError::InvalidResponse("no choices".into()));
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Fit Me", Some("Maybelline"), "", &catalog());
        assert_eq!(out.status, MatchStatus::Exception);
    }

    #[test]
    fn early_statuses_skip_oracle() {
        let oracle = Scripted::answering("Sky High Mascara");
        let adapter = MatchAdapter::new(&oracle, Duration::ZERO);
        let out = adapter.match_product("Fit Me", Some("Revlon"), "", &catalog());
        assert_eq!(out.status, MatchStatus::BrandHasNoProducts);
        assert!(oracle.seen.borrow().is_empty());
    }

    #[test]
    fn prompt_lists_candidates_one_per_line() {
        let req = OracleRequest {
            raw_product: "fit me".into(),
            brand: "Maybelline".into(),
            candidates: vec!["Fit Me Matte Foundation".into(), "Sky High Mascara".into()],
        };
        let prompt = req.prompt();
        assert!(prompt.contains("Raw product: \"fit me\""));
        assert!(prompt.contains("Brand: \"Maybelline\""));
        assert!(prompt.contains("Fit Me Matte Foundation\nSky High Mascara\n"));
        assert!(prompt.ends_with("exact product name or NONE:"));
    }
}
