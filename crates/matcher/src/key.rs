use std::fmt;

use crate::model::RawRecord;

/// Stable identity of a raw record: `video_id|brand_raw|product_line_raw|shade_raw`.
///
/// Built from the untrimmed field values, so two records are the same unit
/// of work only when all four fields are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn of(record: &RawRecord) -> Self {
        Self(format!(
            "{}|{}|{}|{}",
            record.video_id, record.brand_raw, record.product_line_raw, record.shade_raw
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
