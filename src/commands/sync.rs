use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use reconcile::{
    CartDiscounts, Categories, Inventories, Products, StatisticsSnapshot, StoredKind, SyncError,
    Syncer,
};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use super::plan::count;
use super::{Source, open_source};
use crate::Context;
use crate::cli::{Kind, SyncArgs};
use crate::progress::SyncProgress;
use crate::ui;

pub fn run(ctx: &Context, args: &SyncArgs) -> Result<()> {
    match args.source.kind {
        Kind::Products => sync::<Products>(ctx, args),
        Kind::Categories => sync::<Categories>(ctx, args),
        Kind::CartDiscounts => sync::<CartDiscounts>(ctx, args),
        Kind::Inventory => sync::<Inventories>(ctx, args),
    }
}

/// One failed draft in the JSON run report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub key: Option<String>,
    pub category: String,
    pub retryable: bool,
    pub message: String,
}

impl FailureRecord {
    fn new(message: &str, error: &SyncError) -> Self {
        Self {
            key: error.key().map(str::to_string),
            category: error.category().to_string(),
            retryable: error.is_retryable(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub kind: &'static str,
    pub catalog: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub statistics: StatisticsSnapshot,
    pub failures: Vec<FailureRecord>,
}

fn sync<K: StoredKind>(ctx: &Context, args: &SyncArgs) -> Result<()> {
    let Source {
        file,
        drafts,
        mut options,
    } = open_source::<K>(ctx, &args.source)?;

    if drafts.is_empty() {
        ui::info(&format!("No {} in {}", K::NAME, args.source.drafts.display()));
        return Ok(());
    }
    if let Some(jobs) = args.jobs {
        options = options.with_parallelism(jobs);
    }

    let preview = count(&Syncer::new(file.catalog(), options.clone()).plan(drafts.clone()));
    if !preview.has_work() && preview.failed == 0 {
        ui::success(&format!("All {} {} are up to date", drafts.len(), K::NAME));
        return Ok(());
    }

    ui::header(&format!("Sync {} into {}", K::NAME, file.path().display()));
    ui::kv("create", &preview.create.to_string());
    ui::kv("update", &preview.update.to_string());
    ui::kv("unchanged", &preview.unchanged.to_string());
    if preview.failed > 0 {
        ui::kv("failing", &preview.failed.to_string());
    }
    println!();

    if !args.yes && preview.has_work() {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Apply these changes?")
            .default(true)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            ui::info("Aborted");
            return Ok(());
        }
    }

    let failures: Arc<Mutex<Vec<FailureRecord>>> = Arc::default();
    let sink = Arc::clone(&failures);
    let options = options.with_error_callback(move |message, error| {
        log::debug!("{message}");
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FailureRecord::new(message, error));
    });

    let progress = SyncProgress::new(drafts.len(), ctx.quiet);
    let started_at = Utc::now();
    let stats = Syncer::new(file.catalog(), options)
        .with_progress(&progress)
        .sync(drafts);
    let finished_at = Utc::now();
    progress.finish();

    file.save()?;

    ui::header("Summary");
    ui::statistics(&stats.snapshot());
    println!();
    ui::dim(&stats.report_message());

    if let Some(path) = &args.report {
        let failures = std::mem::take(&mut *failures.lock().unwrap_or_else(PoisonError::into_inner));
        let report = RunReport {
            kind: K::NAME,
            catalog: file.path().display().to_string(),
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            statistics: stats.snapshot(),
            failures,
        };
        write_report(path, &report)?;
        ui::dim(&format!("Report written to {}", path.display()));
    }

    if stats.failed() > 0 {
        bail!(
            "{} of {} {} failed to sync",
            stats.failed(),
            stats.processed(),
            K::NAME
        );
    }
    ui::success("Sync complete");
    Ok(())
}

fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{SyncStatistics, ValidationError};
    use tempfile::TempDir;

    #[test]
    fn test_failure_record_keeps_key_and_category() {
        let error = SyncError::Conflict {
            key: "shirt".to_string(),
            expected: 1,
            actual: 2,
        };
        let record = FailureRecord::new("boom", &error);
        assert_eq!(record.key.as_deref(), Some("shirt"));
        assert!(record.retryable);
        assert_eq!(record.category, "Concurrent modification");

        let invalid = SyncError::Validation {
            key: None,
            reason: ValidationError::MissingKey,
        };
        let record = FailureRecord::new("no key", &invalid);
        assert_eq!(record.key, None);
        assert!(!record.retryable);
    }

    #[test]
    fn test_write_report() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reports/run.json");
        let now = Utc::now();
        let report = RunReport {
            kind: "categories",
            catalog: "catalog.json".to_string(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
            statistics: SyncStatistics::new("categories").snapshot(),
            failures: Vec::new(),
        };
        write_report(&path, &report).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["kind"], "categories");
        assert_eq!(value["durationMs"], 0);
        assert!(value["failures"].as_array().unwrap().is_empty());
    }
}
