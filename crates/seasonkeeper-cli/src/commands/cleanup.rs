use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use watch_core::SessionContext;

pub async fn run_cleanup(ctx: &AppContext, user: &str, output: &Output) -> Result<()> {
    let store = ctx.open_store().await?;
    let mut session = SessionContext::new();

    let report = session
        .ensure_cleanup(store.as_ref(), user)
        .await
        .map_err(|e| eyre!("Cleanup failed: {}", e))?
        .unwrap_or_default();

    if !output.is_human() {
        output.data(&report);
        return Ok(());
    }

    let summary = format!(
        "Examined {} series, repaired {}, {} could not be fixed",
        report.examined, report.repaired, report.failed
    );
    if report.failed > 0 {
        output.warn(summary);
    } else {
        output.success(summary);
    }
    Ok(())
}
