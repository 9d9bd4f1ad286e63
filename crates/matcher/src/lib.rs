//! prodmatch-matcher - resumable product-line matching engine
//!
//! Pure engine crate: receives pre-loaded records and a catalog, asks an
//! [`Oracle`] to pick among deterministically narrowed candidates, and
//! persists every decision as it is made. No CLI or HTTP dependencies.

pub mod candidates;
pub mod error;
pub mod key;
pub mod model;
pub mod oracle;
pub mod pipeline;
pub mod shade;
pub mod store;
pub mod summary;

pub use error::MatchError;
pub use key::RecordKey;
pub use model::{AnnotatedRecord, Catalog, CatalogEntry, MatchOutcome, MatchStatus, RawRecord};
pub use oracle::{MatchAdapter, Oracle, OracleError, OracleRequest};
pub use pipeline::{Pipeline, PipelineOptions, RunOutcome};
pub use store::OutputStore;
pub use summary::{RunStats, SummaryReport};
