use super::{import_ui::is_interactive, prompts};
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{modifiers, presets, Attribute, Cell, Table};
use serde_json::json;
use watch_state_config::{Config, PathManager};

pub fn run_config(cmd: ConfigCommands, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(paths, output),
        ConfigCommands::Init { force } => init_config(force, paths, output),
    }
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn show_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let exists = config_file.exists();
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

    let env_key = std::env::var("TMDB_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let api_key = match (&config.catalog.api_key, &env_key) {
        (Some(key), _) if !key.trim().is_empty() => mask_string(key),
        (_, Some(key)) => format!("{} (TMDB_API_KEY)", mask_string(key)),
        _ => "not set".to_string(),
    };
    let store_file = crate::app::store_path(&config, paths);

    if !output.is_human() {
        output.emit(&json!({
            "configFile": config_file,
            "configFileExists": exists,
            "catalog": {
                "provider": config.catalog.provider,
                "apiKey": api_key,
                "baseUrl": config.catalog.base_url,
                "language": config.catalog.language,
                "timeoutSeconds": config.catalog.timeout_seconds,
            },
            "import": {
                "concurrency": config.import.concurrency,
                "statusMapping": config.import.status_mapping,
            },
            "storage": { "path": store_file },
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    if !exists {
        output.warn(format!(
            "No configuration file at {}, showing defaults. Run 'watchkeep config init' to create one.",
            config_file.display()
        ));
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Setting").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec!["Config file".to_string(), config_file.display().to_string()]);
    table.add_row(vec!["Catalog provider".to_string(), config.catalog.provider.clone()]);
    table.add_row(vec!["API key".to_string(), api_key]);
    table.add_row(vec!["Base URL".to_string(), config.catalog.base_url.clone()]);
    table.add_row(vec![
        "Language".to_string(),
        config.catalog.language.clone().unwrap_or_else(|| "catalog default".to_string()),
    ]);
    table.add_row(vec!["Timeout".to_string(), format!("{}s", config.catalog.timeout_seconds)]);
    table.add_row(vec!["Import concurrency".to_string(), config.import.concurrency.to_string()]);
    let mut mappings: Vec<String> = config
        .import
        .status_mapping
        .iter()
        .map(|(state, status)| format!("{} → {}", state, status))
        .collect();
    mappings.sort();
    table.add_row(vec![
        "Extra status mappings".to_string(),
        if mappings.is_empty() { "none".to_string() } else { mappings.join("\n") },
    ]);
    table.add_row(vec!["Store file".to_string(), store_file.display().to_string()]);
    println!("{}", table);

    if let Err(e) = config.validate() {
        output.warn(format!("Configuration is invalid: {}", e));
    }
    Ok(())
}

fn init_config(force: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        let overwrite = is_interactive()
            && prompts::prompt_yes_no(
                &format!("{} already exists. Overwrite it with defaults?", config_file.display()),
                false,
            )?;
        if !overwrite {
            output.warn(format!(
                "Configuration already exists at {} (use --force to overwrite)",
                config_file.display()
            ));
            return Ok(());
        }
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create watchkeep directories: {}", e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    output.info("Set catalog.api_key (or the TMDB_API_KEY environment variable) before adding or importing titles.");
    Ok(())
}
