use anyhow::{Context as _, Result};
use colored::Colorize;
use reconcile::{
    CartDiscounts, Categories, Inventories, PlanAction, Products, StoredKind, Syncer,
    UpdateAction,
};
use serde::Serialize;

use super::{Source, open_source};
use crate::Context;
use crate::cli::{Kind, PlanArgs};
use crate::ui;

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    match args.source.kind {
        Kind::Products => plan::<Products>(ctx, args),
        Kind::Categories => plan::<Categories>(ctx, args),
        Kind::CartDiscounts => plan::<CartDiscounts>(ctx, args),
        Kind::Inventory => plan::<Inventories>(ctx, args),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl PlanCounts {
    pub fn has_work(&self) -> bool {
        self.create + self.update > 0
    }
}

/// Tally a plan without printing it
pub fn count<K: StoredKind>(changes: &[reconcile::PlannedChange<K>]) -> PlanCounts {
    let mut counts = PlanCounts::default();
    for change in changes {
        match change.action {
            PlanAction::Create(_) => counts.create += 1,
            PlanAction::Update { .. } => counts.update += 1,
            PlanAction::Unchanged => counts.unchanged += 1,
            PlanAction::Fail(_) => counts.failed += 1,
        }
    }
    counts
}

fn plan<K: StoredKind>(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let Source {
        file,
        drafts,
        options,
    } = open_source::<K>(ctx, &args.source)?;

    ui::header(&format!(
        "Plan: {} {} against {}",
        drafts.len(),
        K::NAME,
        file.path().display()
    ));

    let changes = Syncer::new(file.catalog(), options).plan(drafts);
    for change in &changes {
        let key = change.key.as_deref().unwrap_or("<no key>");
        for warning in &change.warnings {
            ui::warn(&format!("{key}: {warning}"));
        }
        match &change.action {
            PlanAction::Create(draft) => {
                ui::planned_create(key);
                if args.diff {
                    print_text_diff("", &to_pretty(draft)?);
                }
            }
            PlanAction::Update { existing, actions } => {
                ui::planned_update(key, actions);
                if args.diff {
                    show_update_diff::<K>(existing, actions)?;
                }
            }
            PlanAction::Unchanged => {
                if ctx.verbose > 0 {
                    ui::planned_unchanged(key);
                }
            }
            PlanAction::Fail(error) => ui::error(&error.to_string()),
        }
    }

    let counts = count(&changes);
    println!();
    ui::info(&format!(
        "{} to create, {} to update, {} unchanged, {} failing",
        counts.create, counts.update, counts.unchanged, counts.failed
    ));
    Ok(())
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("Could not serialize resource")?;
    text.push('\n');
    Ok(text)
}

/// Replay the actions locally and diff the resource JSON
fn show_update_diff<K: StoredKind>(existing: &K::Resource, actions: &[UpdateAction]) -> Result<()> {
    match K::replay(existing, actions) {
        Ok(updated) => print_text_diff(&to_pretty(existing)?, &to_pretty(&updated)?),
        Err(e) => ui::error(&format!("the catalog would reject these actions: {e}")),
    }
    Ok(())
}

fn print_text_diff(before: &str, after: &str) {
    let diff = similar::TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => print!("    {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => print!("    {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}
