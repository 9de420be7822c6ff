use color_eyre::Result;
use dialoguer::{Confirm, Select};
use watch_state_models::{CatalogSearchResult, ImportEntry};

fn candidate_label(candidate: &CatalogSearchResult) -> String {
    let year = candidate
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "????".to_string());
    let mut label = format!(
        "{} ({}) [{} {}]",
        candidate.title, year, candidate.content_type, candidate.catalog_id
    );
    if let Some(overview) = candidate.overview.as_deref().filter(|o| !o.is_empty()) {
        let short: String = overview.chars().take(60).collect();
        label.push_str(" - ");
        label.push_str(&short);
        if overview.chars().count() > 60 {
            label.push('…');
        }
    }
    label
}

/// Ask which candidate an ambiguous entry means. `None` skips the entry.
pub fn choose_candidate<'a>(
    entry: &ImportEntry,
    candidates: &'a [CatalogSearchResult],
) -> Result<Option<&'a CatalogSearchResult>> {
    let mut items: Vec<String> = candidates.iter().map(candidate_label).collect();
    items.push("Skip this entry".to_string());

    let prompt = match entry.year {
        Some(year) => format!("'{}' ({}) matched several titles", entry.name, year),
        None => format!("'{}' matched several titles", entry.name),
    };
    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read selection: {}", e))?;

    Ok(candidates.get(selection))
}

/// Prompt for yes/no with a default
pub fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read confirmation: {}", e))
}
