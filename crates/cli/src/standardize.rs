// run / status / report

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use prodmatch_config::ai::ResolvedOracleConfig;
use prodmatch_config::settings::Settings;
use prodmatch_matcher::model::NonMatchEntry;
use prodmatch_matcher::store::{load_catalog, load_records, OutputFiles};
use prodmatch_matcher::{OutputStore, Pipeline, PipelineOptions, RunStats, SummaryReport};
use prodmatch_oracle_client::{ClientError, OpenAiOracle};

use crate::exit_codes::EXIT_ORACLE_MISSING_KEY;
use crate::CliError;

pub fn cmd_run(settings: &Settings, records_path: &Path, catalog_path: &Path, json: bool) -> Result<(), CliError> {
    let records = load_records(records_path).map_err(CliError::matcher)?;
    let catalog = load_catalog(catalog_path).map_err(CliError::matcher)?;
    log::info!(
        "loaded {} records and {} catalog products",
        records.len(),
        catalog.products.len()
    );

    let resolved = ResolvedOracleConfig::from_settings(&settings.oracle);
    let oracle = OpenAiOracle::from_config(&resolved).map_err(|e| match e {
        ClientError::MissingKey(msg) => CliError::new(EXIT_ORACLE_MISSING_KEY, msg)
            .with_hint("run `prodmatch doctor` to see where keys are looked up"),
        ClientError::Build(msg) => CliError::general(msg),
    })?;
    log::info!(
        "oracle: {} at {} (key from {})",
        oracle.model(),
        resolved.base_url,
        resolved.key_source.as_str()
    );

    let options = PipelineOptions {
        rate_limit: Duration::from_millis(settings.rate_limit_ms),
        retry_failed: settings.retry_failed,
        progress_every: settings.progress_every,
    };
    let pipeline = Pipeline::new(OutputStore::new(&settings.output_dir), &catalog, &oracle, options);
    let outcome = pipeline.run(&records).map_err(CliError::matcher)?;

    let report = SummaryReport::build(outcome.stats.clone(), &outcome.records, settings.top_n);

    if json {
        return print_json(&serde_json::json!({
            "schema_version": 1,
            "output_files": outcome.files,
            "resumed": outcome.resumed,
            "pending": outcome.pending,
            "already_complete": outcome.already_complete(),
            "summary": report,
        }));
    }

    if outcome.already_complete() {
        eprintln!("All records already processed.");
    }
    print_summary("this run", &report, &outcome.files);
    Ok(())
}

pub fn cmd_status(settings: &Settings, json: bool) -> Result<(), CliError> {
    let store = OutputStore::new(&settings.output_dir);
    let Some(checkpoint) = store.load_checkpoint().map_err(CliError::matcher)? else {
        if json {
            return print_json(&serde_json::json!({
                "schema_version": 1,
                "output_dir": store.dir(),
                "checkpoint": null,
            }));
        }
        println!("No session in {}", store.dir().display());
        return Ok(());
    };

    let files = &checkpoint.output_files;
    let records = store.load_standardized(files).map_err(CliError::matcher)?;
    let non_matches = store.load_non_matches(files).map_err(CliError::matcher)?;

    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    for rec in records.iter().flatten() {
        *by_status.entry(rec.product_match_status.as_str()).or_default() += 1;
    }
    let total = records.as_ref().map_or(0, Vec::len);

    if json {
        return print_json(&serde_json::json!({
            "schema_version": 1,
            "output_dir": store.dir(),
            "checkpoint": checkpoint,
            "standardized_exists": records.is_some(),
            "records": total,
            "by_status": by_status,
            "non_match_rows": non_matches.len(),
        }));
    }

    println!("Session");
    println!("-------");
    println!("checkpoint:    {}", store.checkpoint_path().display());
    println!("last_updated:  {}", checkpoint.last_updated);
    println!("standardized:  {}", files.standardized.display());
    if records.is_none() {
        println!("               (missing; next run starts a new session)");
    }
    println!("non_matches:   {} ({} rows)", files.non_matches.display(), non_matches.len());
    println!("records:       {}", total);
    for (status, count) in &by_status {
        println!("  {:<22} {}", status, count);
    }
    Ok(())
}

pub fn cmd_report(settings: &Settings, json: bool) -> Result<(), CliError> {
    let store = OutputStore::new(&settings.output_dir);
    let no_session = || {
        CliError::args(format!("no session output in {}", store.dir().display()))
            .with_hint("run `prodmatch run <records> <catalog>` first")
    };

    let checkpoint = store.load_checkpoint().map_err(CliError::matcher)?.ok_or_else(no_session)?;
    let records = store
        .load_standardized(&checkpoint.output_files)
        .map_err(CliError::matcher)?
        .ok_or_else(no_session)?;

    // Session-wide counters, rebuilt from the stored statuses.
    let mut totals = RunStats::default();
    for rec in &records {
        totals.record(rec.product_match_status);
    }
    let report = SummaryReport::build(totals, &records, settings.top_n);

    if json {
        return print_json(&serde_json::json!({
            "schema_version": 1,
            "output_files": checkpoint.output_files,
            "summary": report,
        }));
    }

    print_summary("session", &report, &checkpoint.output_files);
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::general(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn print_summary(scope: &str, report: &SummaryReport, files: &OutputFiles) {
    let rule = "=".repeat(50);
    let stats = &report.run;

    eprintln!();
    eprintln!("{rule}");
    eprintln!("SUMMARY ({scope})");
    eprintln!("{rule}");
    eprintln!("Records processed:   {}", stats.processed);
    eprintln!("Oracle calls:        {}", stats.oracle_calls);
    eprintln!(
        "Errors:              {} (api_error: {}, exception: {})",
        stats.api_errors + stats.exceptions,
        stats.api_errors,
        stats.exceptions
    );
    eprintln!("Skipped (no brand):  {}", stats.skipped_no_brand);
    eprintln!(
        "Product matches:     {}/{} ({}%)",
        report.product_matches, report.records_with_brand, report.match_rate_pct
    );
    eprintln!();
    eprintln!("Standardized: {}", files.standardized.display());

    let buckets = &report.non_matches;
    if buckets.unique_total() == 0 {
        eprintln!("Non-matches:  none");
        return;
    }
    eprintln!(
        "Non-matches:  {} ({} unique)",
        files.non_matches.display(),
        buckets.unique_total()
    );

    print_bucket("Not in catalog", &buckets.not_in_catalog, buckets.not_in_catalog_total);
    print_bucket("Hallucinated", &buckets.hallucinated, buckets.hallucinated_total);
    print_bucket("Other", &buckets.other, buckets.other_total);
}

fn print_bucket(title: &str, rows: &[NonMatchEntry], total: usize) {
    if rows.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{} (top {} of {}):", title, rows.len(), total);
    for row in rows {
        let shade = if row.shade_raw.is_empty() { String::new() } else { format!(" | {}", row.shade_raw) };
        eprintln!(
            "  {:>4}x  {} | {}{}  [{}]",
            row.count,
            row.brand,
            truncate(&row.product_raw, 40),
            shade,
            row.reason
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
