use super::migrate_ui::{is_interactive, MigrateUI};
use super::{prompts, AppContext};
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use watch_core::{MigrationEngine, MigrationOutcome, MigrationResult};

pub async fn run_migrate(ctx: &AppContext, user: &str, yes: bool, output: &Output) -> Result<()> {
    tracing::debug!("Migrate command started");

    if !yes {
        if !is_interactive() {
            return Err(eyre!("Refusing to migrate without confirmation; pass --yes in scripts"));
        }
        let prompt = format!(
            "Update season data for every series of '{}' in {}?",
            user,
            ctx.store_path().display()
        );
        if !prompts::prompt_yes_no(&prompt, Some(true), output)? {
            output.info("Migration cancelled");
            return Ok(());
        }
    }

    let store = ctx.open_store().await?;
    let catalog = ctx.catalog()?;

    let ui = MigrateUI::new();
    let engine = MigrationEngine::from_config(store, catalog, &ctx.config.migration)
        .with_progress(ui.observer());

    let result = engine
        .migrate_all_series(user)
        .await
        .map_err(|e| eyre!("Migration failed: {}", e))?;
    ui.finish();

    if output.is_human() {
        print_summary(&result, output);
    } else {
        output.data(&result);
    }
    Ok(())
}

fn print_summary(result: &MigrationResult, output: &Output) {
    if result.total == 0 {
        output.info("No series found for this user");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Outcome").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Seasons").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Reason").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for detail in &result.details {
        let outcome = match detail.outcome {
            MigrationOutcome::Updated => Cell::new("updated").fg(Color::Green),
            MigrationOutcome::Skipped => Cell::new("skipped"),
            MigrationOutcome::Failed => Cell::new("failed").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&detail.title),
            outcome,
            Cell::new(detail.total_seasons.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())),
            Cell::new(detail.reason.as_ref().map(|r| r.to_string()).unwrap_or_default()),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    output.println(table.to_string());

    let elapsed = result.finished_at - result.started_at;
    let summary = format!(
        "{} series in {}s: {} updated, {} skipped, {} failed",
        result.total,
        elapsed.num_seconds(),
        result.updated,
        result.skipped,
        result.failed
    );
    if result.has_failures() {
        output.warn(summary);
        output.println(format!("{}", "Failed items can be retried with 'seasonkeeper refresh <item>'".dimmed()));
    } else {
        output.success(summary);
    }
}
