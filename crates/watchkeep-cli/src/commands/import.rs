use super::import_ui::{is_interactive, ImportUi};
use super::prompts;
use crate::app::App;
use crate::output::Output;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use comfy_table::{modifiers, presets, Attribute, Cell, Color, Table};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};
use watch_state_models::{ContentType, ImportClassification, ImportEntry, ImportOutcome};

/// One CSV line: `name,year,type,state,rating,rating_date,tmdb_id`
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year: Option<i32>,
    #[serde(default, rename = "type")]
    content_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    rating: Option<u8>,
    #[serde(default)]
    rating_date: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    tmdb_id: Option<u64>,
}

impl CsvRow {
    fn into_entry(self) -> Result<ImportEntry, String> {
        let content_type = self
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<ContentType>())
            .transpose()?;
        let rating_custom_date = self
            .rating_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(super::parse_date)
            .transpose()?;
        Ok(ImportEntry {
            catalog_id: self.tmdb_id,
            name: self.name.trim().to_string(),
            year: self.year,
            content_type,
            state: self.state.filter(|s| !s.trim().is_empty()),
            rating: self.rating,
            rating_custom_date,
        })
    }
}

/// One item of an import file; `problem` is set when it could not be read
#[derive(Debug)]
pub struct ImportRow {
    pub entry: ImportEntry,
    pub problem: Option<String>,
}

impl ImportRow {
    fn valid(entry: ImportEntry) -> Self {
        Self { entry, problem: None }
    }

    fn invalid(name: &str, problem: String) -> Self {
        Self {
            entry: ImportEntry::named(name.trim()),
            problem: Some(problem),
        }
    }
}

fn parse_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().wrap_err("Invalid CSV header")?.clone();
    let name_column = headers.iter().position(|h| h == "name");

    let mut rows = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let line = line + 2;
        let record = record.wrap_err_with(|| format!("Invalid CSV row {}", line))?;
        let name = name_column.and_then(|i| record.get(i)).unwrap_or_default();
        let parsed = record
            .deserialize::<CsvRow>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(CsvRow::into_entry);
        rows.push(match parsed {
            Ok(entry) => ImportRow::valid(entry),
            Err(e) => ImportRow::invalid(name, format!("invalid CSV row {}: {}", line, e)),
        });
    }
    Ok(rows)
}

fn parse_json(content: &str) -> Result<Vec<ImportRow>> {
    let items: Vec<serde_json::Value> = serde_json::from_str(content)
        .wrap_err("Invalid JSON import file, expected an array of entries")?;
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let name = item
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();
            match serde_json::from_value::<ImportEntry>(item) {
                Ok(entry) => ImportRow::valid(entry),
                Err(e) => ImportRow::invalid(&name, format!("invalid entry {}: {}", index + 1, e)),
            }
        })
        .collect())
}

/// Read rows from a `.json` or `.csv` file (content sniffed for other extensions)
pub fn read_entries(path: &Path) -> Result<Vec<ImportRow>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match extension.as_deref() {
        Some("json") => parse_json(&content),
        Some("csv") => parse_csv(content.as_bytes()),
        _ if content.trim_start().starts_with('[') => parse_json(&content),
        _ => parse_csv(content.as_bytes()),
    }
}

/// Outcomes for every row: unreadable rows fail, the rest take the reconciled
/// outcomes in order
fn merge_outcomes(rows: &[ImportRow], reconciled: Vec<ImportOutcome>) -> Vec<ImportOutcome> {
    let mut reconciled = reconciled.into_iter();
    rows.iter()
        .filter_map(|row| match &row.problem {
            Some(problem) => Some(ImportOutcome::Failed {
                error: problem.clone(),
                candidates: Vec::new(),
            }),
            None => reconciled.next(),
        })
        .collect()
}

pub async fn run_import(
    app: &App,
    user: u64,
    file: &Path,
    concurrency: Option<usize>,
    interactive: bool,
    output: &Output,
) -> Result<()> {
    let rows = read_entries(file)?;
    if rows.is_empty() {
        output.warn(format!("No entries found in {}", file.display()));
        return Ok(());
    }

    let (positions, entries): (Vec<usize>, Vec<ImportEntry>) = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.problem.is_none())
        .map(|(position, row)| (position, row.entry.clone()))
        .unzip();
    if entries.len() < rows.len() {
        warn!("{} of {} entries in {} could not be read", rows.len() - entries.len(), rows.len(), file.display());
    }

    let concurrency = concurrency.unwrap_or(app.config.import.concurrency).max(1);
    info!("Importing {} entries from {} (concurrency {})", entries.len(), file.display(), concurrency);

    let reconciler = app.reconciler();
    let ui = ImportUi::new(entries.len(), output.is_quiet() || !output.is_human());
    let reconciled = reconciler
        .reconcile_batch_with(user, &entries, concurrency, |index, outcome| {
            ui.record(positions[index], outcome)
        })
        .await;
    ui.finish();
    let mut outcomes = merge_outcomes(&rows, reconciled);

    if interactive {
        if output.is_human() && is_interactive() {
            for (row, outcome) in rows.iter().zip(outcomes.iter_mut()) {
                let ImportOutcome::MultiCandidate { candidates } = &*outcome else {
                    continue;
                };
                let Some(choice) = prompts::choose_candidate(&row.entry, candidates)? else {
                    continue;
                };
                let resolved = ImportEntry {
                    catalog_id: Some(choice.catalog_id),
                    content_type: Some(choice.content_type),
                    ..row.entry.clone()
                };
                *outcome = reconciler.reconcile(user, &resolved).await;
            }
        } else {
            output.warn("--interactive needs a terminal and human output, ambiguous entries left as is");
        }
    }

    app.persist().await?;
    print_report(&rows, &outcomes, output);
    Ok(())
}

fn summarize(outcomes: &[ImportOutcome]) -> BTreeMap<&'static str, usize> {
    let mut summary = BTreeMap::new();
    for outcome in outcomes {
        *summary.entry(outcome.classification().as_str()).or_insert(0) += 1;
    }
    summary
}

fn outcome_cell(classification: ImportClassification) -> Cell {
    let color = match classification {
        ImportClassification::Success => Color::Green,
        ImportClassification::AlreadyExists => Color::Blue,
        ImportClassification::MultiCandidate => Color::Yellow,
        ImportClassification::NotFound | ImportClassification::Failed => Color::Red,
    };
    Cell::new(classification.as_str()).fg(color)
}

fn outcome_details(outcome: &ImportOutcome) -> String {
    match outcome {
        ImportOutcome::Success { watched_entry, .. } | ImportOutcome::AlreadyExists { watched_entry, .. } => {
            format!(
                "record {} · {} · {}",
                watched_entry.id, watched_entry.content.title, watched_entry.status
            )
        }
        ImportOutcome::MultiCandidate { candidates } => candidates
            .iter()
            .map(|c| match c.release_year() {
                Some(year) => format!("{} ({}) [{}]", c.title, year, c.catalog_id),
                None => format!("{} [{}]", c.title, c.catalog_id),
            })
            .collect::<Vec<_>>()
            .join(", "),
        ImportOutcome::NotFound => String::new(),
        ImportOutcome::Failed { error, .. } => error.clone(),
    }
}

fn print_report(rows: &[ImportRow], outcomes: &[ImportOutcome], output: &Output) {
    let summary = summarize(outcomes);
    if !output.is_human() {
        let results: Vec<_> = rows
            .iter()
            .zip(outcomes)
            .map(|(row, outcome)| json!({ "entry": row.entry, "outcome": outcome }))
            .collect();
        output.emit(&json!({ "results": results, "summary": summary }));
        return;
    }
    if output.is_quiet() {
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(
        ["#", "Entry", "Outcome", "Details"]
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    for (index, (row, outcome)) in rows.iter().zip(outcomes).enumerate() {
        let entry = &row.entry;
        let name = match entry.year {
            Some(year) => format!("{} ({})", entry.name, year),
            None => entry.name.clone(),
        };
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(name),
            outcome_cell(outcome.classification()),
            Cell::new(outcome_details(outcome)),
        ]);
    }
    println!("{}", table);

    let line = summary
        .iter()
        .map(|(classification, count)| format!("{}: {}", classification, count))
        .collect::<Vec<_>>()
        .join(" | ");
    if summary.contains_key("FAILED") || summary.contains_key("NOT_FOUND") {
        output.warn(line);
    } else {
        output.success(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    fn valid_entries(rows: Vec<ImportRow>) -> Vec<ImportEntry> {
        rows.into_iter()
            .map(|row| {
                assert_eq!(row.problem, None);
                row.entry
            })
            .collect()
    }

    #[test]
    fn test_read_csv_entries() {
        let mut file = temp_file(".csv");
        writeln!(file, "name,year,type,state,rating,rating_date,tmdb_id").unwrap();
        writeln!(file, "Dune,2021,movie,Completed,9,2021-10-24,").unwrap();
        writeln!(file, "Game of Thrones,,tv,watching,,,1399").unwrap();
        writeln!(file, "Arrival,abc,,,,,").unwrap();

        let entries = valid_entries(read_entries(file.path()).unwrap());
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].name, "Dune");
        assert_eq!(entries[0].year, Some(2021));
        assert_eq!(entries[0].content_type, Some(ContentType::Movie));
        assert_eq!(entries[0].state.as_deref(), Some("Completed"));
        assert_eq!(entries[0].rating, Some(9));
        assert!(entries[0].rating_custom_date.is_some());
        assert_eq!(entries[0].catalog_id, None);

        assert_eq!(entries[1].catalog_id, Some(1399));
        assert_eq!(entries[1].content_type, Some(ContentType::Tv));
        assert_eq!(entries[1].rating, None);

        // Unparseable optional numbers are treated as missing
        assert_eq!(entries[2].year, None);
    }

    #[test]
    fn test_csv_bad_row_does_not_hide_the_others() {
        let rows = parse_csv("name,type\nDune,podcast\nArrival,movie\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].entry.name, "Dune");
        assert!(rows[0].problem.as_deref().unwrap().contains("row 2"));
        assert_eq!(rows[1].problem, None);
        assert_eq!(rows[1].entry.content_type, Some(ContentType::Movie));
    }

    #[test]
    fn test_read_json_entries_with_aliases() {
        let mut file = temp_file(".json");
        write!(
            file,
            r#"[
                {{"name": "Dune", "year": 2021, "type": "movie", "state": "finished", "rating": 9}},
                {{"name": "Severance", "tmdbId": 95396, "type": "tv"}}
            ]"#
        )
        .unwrap();

        let entries = valid_entries(read_entries(file.path()).unwrap());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rating, Some(9));
        assert_eq!(entries[1].catalog_id, Some(95396));
        assert_eq!(entries[1].content_type, Some(ContentType::Tv));
    }

    #[test]
    fn test_json_string_years_and_bad_entries() {
        let rows = parse_json(
            r#"[
                {"name": "Dune", "year": "2021", "type": "movie", "rating": 9},
                {"name": "Arrival", "year": "2016"},
                {"name": "Heat", "rating": "nine"}
            ]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].problem, None);
        assert_eq!(rows[0].entry.year, Some(2021));
        assert_eq!(rows[1].problem, None);
        assert_eq!(rows[1].entry.year, Some(2016));

        assert_eq!(rows[2].entry.name, "Heat");
        assert!(rows[2].problem.as_deref().unwrap().contains("entry 3"));
    }

    #[test]
    fn test_json_that_is_not_an_array_is_rejected() {
        assert!(parse_json(r#"{"name": "Dune"}"#).is_err());
    }

    #[test]
    fn test_unreadable_rows_fail_in_place() {
        let rows = parse_json(r#"[{"name": "Dune"}, {"name": 7}, {"name": "Heat"}]"#).unwrap();
        let reconciled = vec![ImportOutcome::NotFound, ImportOutcome::MultiCandidate { candidates: Vec::new() }];

        let outcomes = merge_outcomes(&rows, reconciled);

        let classifications: Vec<_> = outcomes.iter().map(|o| o.classification()).collect();
        assert_eq!(
            classifications,
            vec![
                ImportClassification::NotFound,
                ImportClassification::Failed,
                ImportClassification::MultiCandidate,
            ]
        );
    }

    #[test]
    fn test_summary_counts_classifications() {
        let outcomes = vec![ImportOutcome::NotFound, ImportOutcome::NotFound, ImportOutcome::MultiCandidate { candidates: Vec::new() }];
        let summary = summarize(&outcomes);
        assert_eq!(summary.get("NOT_FOUND"), Some(&2));
        assert_eq!(summary.get("MULTI_CANDIDATE"), Some(&1));
        assert_eq!(summary.get("SUCCESS"), None);
    }
}
