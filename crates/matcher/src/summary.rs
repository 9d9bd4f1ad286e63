use std::collections::HashMap;

use serde::Serialize;

use crate::model::{AnnotatedRecord, MatchStatus, NonMatchEntry};

/// Counters for records processed in the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub processed: usize,
    pub oracle_calls: usize,
    pub exceptions: usize,
    pub api_errors: usize,
    pub skipped_no_brand: usize,
}

impl RunStats {
    pub fn record(&mut self, status: MatchStatus) {
        self.processed += 1;
        if status.consulted_oracle() {
            self.oracle_calls += 1;
        }
        match status {
            MatchStatus::Exception => self.exceptions += 1,
            MatchStatus::ApiError => self.api_errors += 1,
            MatchStatus::NoBrand => self.skipped_no_brand += 1,
            _ => {}
        }
    }
}

/// Collapse unresolved branded records into counted report rows.
///
/// Only records with a standardized brand, no product line and a non-empty
/// raw product contribute. Rows are sorted by count, most frequent first;
/// ties keep first-seen order.
pub fn aggregate_non_matches(records: &[AnnotatedRecord]) -> Vec<NonMatchEntry> {
    let mut rows: Vec<NonMatchEntry> = Vec::new();
    let mut index: HashMap<(String, String, String, MatchStatus), usize> = HashMap::new();

    for rec in records {
        let Some(brand) = rec.record.brand() else { continue };
        if rec.is_resolved() {
            continue;
        }
        let product = rec.record.product();
        if product.is_empty() {
            continue;
        }
        let shade = rec.record.shade();
        let status = rec.product_match_status;

        let key = (brand.to_string(), product.to_string(), shade.to_string(), status);
        match index.get(&key) {
            Some(&i) => rows[i].count += 1,
            None => {
                index.insert(key, rows.len());
                rows.push(NonMatchEntry {
                    brand: brand.to_string(),
                    product_raw: product.to_string(),
                    shade_raw: shade.to_string(),
                    reason: status,
                    count: 1,
                    product_line_standardized: None,
                });
            }
        }
    }

    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Non-matches split by reason, each truncated for display.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NonMatchBuckets {
    /// Unique rows per bucket before truncation.
    pub not_in_catalog_total: usize,
    pub hallucinated_total: usize,
    pub other_total: usize,
    pub not_in_catalog: Vec<NonMatchEntry>,
    pub hallucinated: Vec<NonMatchEntry>,
    pub other: Vec<NonMatchEntry>,
}

impl NonMatchBuckets {
    /// `rows` must already be sorted by count.
    pub fn from_rows(rows: &[NonMatchEntry], top_n: usize) -> Self {
        let mut buckets = Self::default();
        for row in rows {
            let (total, list) = match row.reason {
                MatchStatus::AiReturnedNone => (&mut buckets.not_in_catalog_total, &mut buckets.not_in_catalog),
                MatchStatus::AiHallucinated => (&mut buckets.hallucinated_total, &mut buckets.hallucinated),
                _ => (&mut buckets.other_total, &mut buckets.other),
            };
            *total += 1;
            if list.len() < top_n {
                list.push(row.clone());
            }
        }
        buckets
    }

    pub fn unique_total(&self) -> usize {
        self.not_in_catalog_total + self.hallucinated_total + self.other_total
    }
}

/// End-of-run report: this run's counters plus whole-session coverage.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub run: RunStats,
    pub total_records: usize,
    pub records_with_brand: usize,
    pub product_matches: usize,
    /// Rounded percentage of branded records that received a product line.
    pub match_rate_pct: u32,
    pub non_matches: NonMatchBuckets,
}

impl SummaryReport {
    pub fn build(run: RunStats, records: &[AnnotatedRecord], top_n: usize) -> Self {
        let records_with_brand = records.iter().filter(|r| r.record.brand().is_some()).count();
        let product_matches = records
            .iter()
            .filter(|r| r.record.brand().is_some() && r.is_resolved())
            .count();
        let match_rate_pct = if records_with_brand == 0 {
            0
        } else {
            ((product_matches as f64 / records_with_brand as f64) * 100.0).round() as u32
        };

        let rows = aggregate_non_matches(records);

        Self {
            run,
            total_records: records.len(),
            records_with_brand,
            product_matches,
            match_rate_pct,
            non_matches: NonMatchBuckets::from_rows(&rows, top_n),
        }
    }
}
