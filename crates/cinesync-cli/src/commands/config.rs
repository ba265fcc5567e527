use crate::output::Output;
use crate::ConfigCommands;
use cinesync_config::{Config, PathManager};
use cinesync_models::Identity;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

pub fn run_config(cmd: ConfigCommands, config: Config, config_file: &Path, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(&config, config_file, paths, output),
        ConfigCommands::Init { default_uid, force } => init_config(default_uid, force, config_file, output),
    }
}

fn show_config(config: &Config, config_file: &Path, paths: &PathManager, output: &Output) -> Result<()> {
    let data_file = config
        .documents_file(paths.documents_file())
        .map(|file| file.display().to_string());

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file.display().to_string(),
            "config_file_exists": config_file.exists(),
            "data_file": data_file,
            "store": {
                "collection": config.store.collection,
                "in_memory": config.store.in_memory,
            },
            "user": { "default_uid": config.user.default_uid },
            "logging": {
                "level": config.logging.level,
                "json": config.logging.json,
                "file": config.logging.file.as_ref().map(|file| file.display().to_string()),
            },
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Showing defaults. Run 'cinesync config init' to create it.");
    }

    println!("\n{}\n", "Configuration".bright_cyan().bold());

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Config file"), Cell::new(config_file.display())]);
    table.add_row(vec![
        Cell::new("Data file"),
        Cell::new(data_file.unwrap_or_else(|| "(in memory)".to_string())),
    ]);
    table.add_row(vec![Cell::new("store.collection"), Cell::new(&config.store.collection)]);
    table.add_row(vec![
        Cell::new("user.default_uid"),
        Cell::new(config.user.default_uid.as_deref().unwrap_or("(not set)")),
    ]);
    table.add_row(vec![Cell::new("logging.level"), Cell::new(&config.logging.level)]);
    table.add_row(vec![
        Cell::new("logging.json"),
        Cell::new(config.logging.json.map(|json| json.to_string()).unwrap_or_else(|| "auto".to_string())),
    ]);
    table.add_row(vec![
        Cell::new("logging.file"),
        Cell::new(
            config
                .logging
                .file
                .as_ref()
                .map(|file| file.display().to_string())
                .unwrap_or_else(|| "(stderr)".to_string()),
        ),
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);
    Ok(())
}

fn init_config(default_uid: Option<String>, force: bool, config_file: &Path, output: &Output) -> Result<()> {
    if config_file.exists() && !force {
        return Err(eyre!(
            "Configuration file already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
    }

    let mut config = Config::default();
    if let Some(uid) = default_uid {
        let identity = Identity::new(uid).map_err(|e| eyre!("Invalid --default-uid: {}", e))?;
        config.user.default_uid = Some(identity.uid().to_string());
    }
    config
        .save_to_file(config_file)
        .map_err(|e| eyre!("Failed to write config to {}: {}", config_file.display(), e))?;
    tracing::info!(operation = "config_init", path = %config_file.display(), "Wrote configuration");

    if output.is_human() {
        output.success(format!("Configuration written to {}", config_file.display()));
    } else {
        output.json(&json!({ "config_file": config_file.display().to_string(), "created": true }));
    }
    Ok(())
}
