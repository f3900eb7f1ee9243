use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watch_core::store::load_series;
use watch_core::{
    all_season_progress, apply_action, calculate_progress, next_episode, season_progress,
    BackfillOutcome, EpisodeAction, EpisodeCountBackfill, NextEpisode,
};
use watch_models::{SeriesItem, WatchState};

async fn load_item(ctx: &AppContext, item_id: &str) -> Result<SeriesItem> {
    let store = ctx.open_store().await?;
    load_series(store.as_ref(), item_id)
        .await
        .map_err(|e| eyre!("Cannot load {}: {}", item_id, e))
}

fn progress_bar(percentage: u8) -> String {
    let filled = (percentage as usize * 20) / 100;
    format!("[{}{}]", "█".repeat(filled), "·".repeat(20 - filled))
}

pub async fn run_progress(ctx: &AppContext, item_id: &str, output: &Output) -> Result<()> {
    let item = load_item(ctx, item_id).await?;
    let progress = calculate_progress(&item.state);
    let seasons = all_season_progress(&item.state);

    if !output.is_human() {
        output.data(&json!({
            "itemId": item.id,
            "title": item.title,
            "progress": progress,
            "seasons": seasons,
        }));
        return Ok(());
    }

    output.println(format!("{}", item.display_title().bold().bright_cyan()));
    output.println(format!(
        "{} {}% ({} of {} episodes)",
        progress_bar(progress.percentage),
        progress.percentage,
        progress.total_watched,
        progress.total_episodes
    ));

    if !seasons.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            Cell::new("Season").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Watched").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Episodes").add_attribute(comfy_table::Attribute::Bold),
        ]);
        for season in &seasons {
            let watched = if season.is_complete() {
                Cell::new(season.watched).fg(Color::Green)
            } else {
                Cell::new(season.watched)
            };
            table.add_row(vec![
                Cell::new(season.season),
                watched,
                Cell::new(season.total.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string())),
            ]);
        }
        table.load_preset(comfy_table::presets::UTF8_FULL);
        table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
        output.println(table.to_string());
    }
    Ok(())
}

pub async fn run_next(ctx: &AppContext, item_id: &str, output: &Output) -> Result<()> {
    let item = load_item(ctx, item_id).await?;
    let next = next_episode(&item.state);

    if !output.is_human() {
        output.data(&next);
        return Ok(());
    }

    match next {
        NextEpisode::Episode { .. } => output.info(format!("{}: next up {}", item.display_title(), next)),
        NextEpisode::Complete => output.success(format!("{}: all known episodes watched", item.display_title())),
    }
    if item.state.known_total_seasons().is_none() {
        output.warn("Season count unknown; run 'seasonkeeper refresh' to fetch it");
    }
    Ok(())
}

/// Toggle, mark or clear, computed on the freshly loaded item.
pub async fn run_action(ctx: &AppContext, item_id: &str, action: EpisodeAction, output: &Output) -> Result<()> {
    let store = ctx.open_store().await?;
    let outcome = apply_action(store.as_ref(), item_id, action)
        .await
        .map_err(|e| eyre!("{}", e))?;

    if !output.is_human() {
        output.data(&json!({
            "itemId": item_id,
            "action": action,
            "changed": outcome.changed(),
            "state": outcome.item.state,
        }));
        return Ok(());
    }

    if !outcome.changed() {
        output.info("Nothing to change");
        return Ok(());
    }

    let title = outcome.item.display_title();
    let state = &outcome.item.state;
    match action {
        EpisodeAction::Toggle { season, episode } => {
            let verb = if state.is_episode_watched(season, episode) { "watched" } else { "unwatched" };
            output.success(format!("{}: S{:02}E{:02} marked {}", title, season, episode, verb));
        }
        EpisodeAction::MarkSeason { season, .. } => {
            output.success(format!("{}: season {} marked watched", title, season));
        }
        EpisodeAction::ClearSeason { season } => {
            output.success(format!("{}: season {} cleared", title, season));
        }
    }
    print_resume_point(state, output);
    Ok(())
}

fn print_resume_point(state: &WatchState, output: &Output) {
    if let (Some(season), Some(episode)) = (state.current_season, state.current_episode) {
        output.println(format!("  Resume point: S{:02}E{:02}", season, episode));
    }
}

/// List a season's episodes, fetching the episode count from the catalog if needed.
pub async fn run_list(ctx: &AppContext, item_id: &str, season: u32, output: &Output) -> Result<()> {
    let store = ctx.open_store().await?;
    let item = load_series(store.as_ref(), item_id)
        .await
        .map_err(|e| eyre!("Cannot load {}: {}", item_id, e))?;

    let count = match item.state.episode_count(season) {
        Some(count) => Some(count),
        None => match ctx.catalog() {
            Ok(catalog) => {
                let backfill = EpisodeCountBackfill::new(store.clone(), catalog);
                match backfill.ensure_episode_count(item_id, season).await {
                    Ok(BackfillOutcome::Unavailable) => None,
                    Ok(outcome) => outcome.count(),
                    Err(e) => {
                        output.warn(format!("Could not fetch the episode list: {}", e));
                        None
                    }
                }
            }
            Err(e) => {
                output.warn(e.to_string());
                None
            }
        },
    };

    // Re-read so trimmed episodes are reflected
    let item = load_series(store.as_ref(), item_id)
        .await
        .map_err(|e| eyre!("Cannot load {}: {}", item_id, e))?;
    let progress = season_progress(&item.state, season);

    if !output.is_human() {
        let watched: Vec<u32> = item
            .state
            .watched_episodes
            .get(&season)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        output.data(&json!({
            "itemId": item.id,
            "season": season,
            "episodeCount": count,
            "watchedEpisodes": watched,
        }));
        return Ok(());
    }

    output.println(format!(
        "{} season {} ({} of {} watched)",
        item.display_title().bold(),
        season,
        progress.watched,
        count.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string())
    ));
    match count {
        Some(count) => {
            for episode in 1..=count {
                let marker = if item.state.is_episode_watched(season, episode) {
                    "✓".green().to_string()
                } else {
                    "·".dimmed().to_string()
                };
                output.println(format!("  {} E{:02}", marker, episode));
            }
        }
        None => output.warn("Episode count unknown for this season"),
    }
    Ok(())
}
