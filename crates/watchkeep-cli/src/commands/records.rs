use crate::app::App;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{presets, modifiers, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watch_state_core::{RecordPatch, WatchError};
use watch_state_models::{Activity, ActivityType, ContentType, WatchRecord, WatchedStatus};

fn report(e: WatchError) -> color_eyre::Report {
    eyre!("{}", e)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        header
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn status_cell(status: WatchedStatus) -> Cell {
    let color = match status {
        WatchedStatus::Finished => Color::Green,
        WatchedStatus::Watching => Color::Cyan,
        WatchedStatus::Planned => Color::Blue,
        WatchedStatus::Hold => Color::Yellow,
        WatchedStatus::Dropped => Color::Red,
    };
    Cell::new(status.as_str()).fg(color)
}

fn rating_text(rating: Option<u8>) -> String {
    rating.map(|r| format!("{}/10", r)).unwrap_or_else(|| "-".to_string())
}

fn describe(record: &WatchRecord) -> String {
    match record.content.release_date {
        Some(date) => format!("{} ({})", record.content.title, date.format("%Y")),
        None => record.content.title.clone(),
    }
}

pub async fn add(
    app: &App,
    user: u64,
    catalog_id: u64,
    content_type: ContentType,
    status: WatchedStatus,
    rating: Option<u8>,
    output: &Output,
) -> Result<()> {
    let record = app
        .manager
        .create(user, catalog_id, content_type, status, rating)
        .await
        .map_err(report)?;
    app.persist().await?;

    output.success(format!("Tracking {} as {} (record {})", describe(&record), status, record.id));
    output.emit(&record);
    Ok(())
}

pub async fn update(
    app: &App,
    record_id: u64,
    status: Option<WatchedStatus>,
    rating: Option<u8>,
    thoughts: Option<String>,
    remove_thoughts: bool,
    output: &Output,
) -> Result<()> {
    let patch = RecordPatch {
        status,
        rating,
        thoughts,
        remove_thoughts,
    };
    if patch.is_empty() {
        output.warn("Nothing to update. Use --status, --rating, --thoughts or --remove-thoughts");
        return Ok(());
    }

    let result = app.manager.update(record_id, patch).await.map_err(report)?;
    if result.activities.is_empty() {
        output.info(format!("{} is already up to date", describe(&result.record)));
    } else {
        app.persist().await?;
        for activity in &result.activities {
            output.success(format!("{}: {}", activity.activity_type, activity.data));
        }
    }
    output.emit(&json!({ "record": result.record, "activities": result.activities }));
    Ok(())
}

pub async fn season(
    app: &App,
    record_id: u64,
    season_number: u32,
    status: Option<WatchedStatus>,
    rating: Option<u8>,
    remove: bool,
    output: &Output,
) -> Result<()> {
    let result = if remove {
        app.manager.remove_season(record_id, season_number).await
    } else {
        let status = status.ok_or_else(|| eyre!("--status is required"))?;
        app.manager
            .set_season_status(record_id, season_number, status, rating)
            .await
    };
    let update = result.map_err(report)?;

    match &update.added_activity {
        Some(activity) => {
            app.persist().await?;
            output.success(format!("Season {}: {}", season_number, activity.activity_type));
        }
        None => output.info(format!("Season {} unchanged", season_number)),
    }
    if update.watched {
        output.info("Every season is finished, show marked as watched");
    }
    output.emit(&json!({
        "seasons": update.seasons,
        "addedActivity": update.added_activity,
        "watched": update.watched,
    }));
    Ok(())
}

pub async fn delete(app: &App, record_id: u64, output: &Output) -> Result<()> {
    app.manager.delete(record_id).await.map_err(report)?;
    app.persist().await?;
    output.success(format!("Deleted record {}", record_id));
    output.emit(&json!({ "deleted": record_id }));
    Ok(())
}

pub async fn list(
    app: &App,
    user: u64,
    status: Option<WatchedStatus>,
    output: &Output,
) -> Result<()> {
    let records: Vec<WatchRecord> = app
        .manager
        .list(user)
        .await
        .map_err(report)?
        .into_iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect();

    if !output.is_human() {
        output.emit(&records);
        return Ok(());
    }
    if records.is_empty() {
        output.info("No records yet. Add one with 'watchkeep add <catalog-id>' or 'watchkeep import <file>'");
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    let mut table = new_table(vec!["ID", "Title", "Type", "Status", "Rating", "Watched", "Updated"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(record.id),
            Cell::new(describe(record)),
            Cell::new(record.content_type().as_str()),
            status_cell(record.status),
            Cell::new(rating_text(record.rating)),
            Cell::new(if record.watched { "yes" } else { "" }),
            Cell::new(record.updated_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }
    println!("{}", table);
    Ok(())
}

pub async fn show(app: &App, record_id: u64, output: &Output) -> Result<()> {
    let record = app.manager.get(record_id).await.map_err(report)?;
    if !output.is_human() {
        output.emit(&record);
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("{}", describe(&record).bright_cyan().bold());
    println!(
        "{} {} | {} | rating {} | watched: {}",
        record.content_type().as_str().dimmed(),
        record.catalog_id(),
        record.status,
        rating_text(record.rating),
        record.watched
    );
    if let Some(thoughts) = &record.thoughts {
        println!("\n{}", thoughts.italic());
    }

    let seasons = record.active_seasons();
    if !seasons.is_empty() {
        let mut table = new_table(vec!["Season", "Status", "Rating"]);
        for season in seasons {
            table.add_row(vec![
                Cell::new(season.season_number),
                status_cell(season.status),
                Cell::new(rating_text(season.rating)),
            ]);
        }
        println!("\n{}", table);
    }

    if !record.activity.is_empty() {
        println!();
        print_activity(&record.activity);
    }
    Ok(())
}

fn print_activity(entries: &[Activity]) {
    let mut table = new_table(vec!["Date", "Type", "Data"]);
    for activity in entries {
        let date = activity.display_date().format("%Y-%m-%d %H:%M").to_string();
        let date = if activity.custom_date.is_some() {
            format!("{} *", date)
        } else {
            date
        };
        table.add_row(vec![
            Cell::new(date),
            Cell::new(activity.activity_type.as_str()),
            Cell::new(&activity.data),
        ]);
    }
    println!("{}", table);
}

pub async fn activity(
    app: &App,
    record_id: u64,
    include_deleted: bool,
    note: Option<String>,
    date: Option<String>,
    output: &Output,
) -> Result<()> {
    if let Some(note) = note {
        let custom_date = date
            .as_deref()
            .map(super::parse_date)
            .transpose()
            .map_err(|e| eyre!(e))?;
        let data = json!({ "note": note }).to_string();
        let activity = app
            .manager
            .add_activity(record_id, ActivityType::Custom, data, custom_date)
            .await
            .map_err(report)?;
        app.persist().await?;
        output.success(format!("Added note to record {}", record_id));
        output.emit(&activity);
        return Ok(());
    }

    let history = app
        .manager
        .list_activity(record_id, include_deleted)
        .await
        .map_err(report)?;
    if !output.is_human() {
        output.emit(&history.to_vec());
    } else if history.is_empty() {
        output.info(format!("No activity for record {}", record_id));
    } else if !output.is_quiet() {
        print_activity(&history.to_vec());
    }
    Ok(())
}

pub async fn profile(app: &App, user: u64, output: &Output) -> Result<()> {
    let profile = app.manager.profile(user).await.map_err(report)?;
    output.info(format!(
        "Movies watched: {}\nShows watched: {}",
        profile.movies_watched, profile.shows_watched
    ));
    output.emit(&profile);
    Ok(())
}
