use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use watch_core::store::load_series;
use watch_core::MigrationEngine;

pub async fn run_refresh(ctx: &AppContext, item_id: &str, title: Option<String>, output: &Output) -> Result<()> {
    let store = ctx.open_store().await?;
    let item = load_series(store.as_ref(), item_id)
        .await
        .map_err(|e| eyre!("Cannot refresh {}: {}", item_id, e))?;
    let title = title.unwrap_or_else(|| item.display_title().to_string());

    let engine = MigrationEngine::from_config(store, ctx.catalog()?, &ctx.config.migration);
    let result = engine.refresh_one_series(item_id, &title).await;

    if !output.is_human() {
        output.data(&result);
        if !result.success {
            return Err(eyre!("Could not refresh season count for '{}'", title));
        }
        return Ok(());
    }
    match result.total_seasons {
        Some(seasons) if result.success => {
            output.success(format!("{}: {} seasons", title, seasons));
            Ok(())
        }
        _ => Err(eyre!("Could not refresh season count for '{}'", title)),
    }
}
