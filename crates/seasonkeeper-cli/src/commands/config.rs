use super::{prompts, AppContext};
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watch_config::{Config, OMDB_API_KEY_ENV};

pub fn run_config(ctx: &AppContext, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(ctx, full, output),
        ConfigCommands::Init { force } => init_config(ctx, force, output),
        ConfigCommands::SetKey { key } => set_key(ctx, key, output),
    }
}

fn show_config(ctx: &AppContext, full: bool, output: &Output) -> Result<()> {
    let config = &ctx.config;
    let config_file = ctx.paths.config_file();
    let api_key = config.catalog.resolved_api_key();
    let key_display = match &api_key {
        Some(key) if full => key.clone(),
        Some(key) => mask_string(key),
        None => "<not set>".to_string(),
    };

    if !output.is_human() {
        output.data(&json!({
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file.exists(),
            "catalog": {
                "provider": config.catalog.provider,
                "base_url": config.catalog.base_url,
                "timeout_secs": config.catalog.timeout_secs,
                "api_key": key_display,
            },
            "migration": {
                "rate_limit_delay_ms": config.migration.rate_limit_delay_ms,
                "progress_interval": config.migration.progress_interval,
            },
            "store": { "path": ctx.store_path().display().to_string() },
            "logging": {
                "level": config.logging.level,
                "json": config.logging.json,
                "file": config.logging.file.as_ref().map(|p| p.display().to_string()),
            },
        }));
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!(
            "Configuration file not found at {}; showing defaults. Run 'seasonkeeper config init' to create it.",
            config_file.display()
        ));
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
    ]);
    let rows: Vec<(&str, String)> = vec![
        ("Config File", config_file.display().to_string()),
        ("Catalog Provider", config.catalog.provider.clone()),
        ("Catalog URL", config.catalog.base_url.clone()),
        ("Catalog Timeout", format!("{} seconds", config.catalog.timeout_secs)),
        ("API Key", key_display),
        ("Rate Limit Delay", format!("{} ms", config.migration.rate_limit_delay_ms)),
        ("Progress Interval", format!("every {} items", config.migration.progress_interval)),
        ("Library", ctx.store_path().display().to_string()),
        ("Log Level", config.logging.level.clone()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    output.println(table.to_string());

    if std::env::var(OMDB_API_KEY_ENV).is_ok() {
        output.println(format!("{}", format!("API key taken from ${}", OMDB_API_KEY_ENV).dimmed()));
    }
    Ok(())
}

fn init_config(ctx: &AppContext, force: bool, output: &Output) -> Result<()> {
    let config_file = ctx.paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    ctx.paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}

fn set_key(ctx: &AppContext, key_arg: Option<String>, output: &Output) -> Result<()> {
    let key = match key_arg {
        Some(key) => key,
        None => prompts::prompt_password("OMDb API key")?,
    };
    let key = key.trim().to_string();
    if key.is_empty() {
        return Err(eyre!("API key is required"));
    }

    let config_file = ctx.paths.config_file();
    let mut config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config.catalog.api_key = Some(key.clone());
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("API key saved ({})", mask_string(&key)));
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_API_KEY" {
        return "<not set>".to_string();
    }
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abcd"), "****");
        assert_eq!(mask_string("abcdef123"), "ab***23");
    }
}
