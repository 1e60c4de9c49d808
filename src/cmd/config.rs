//! Configuration view and validation commands: `stratflow config`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use stratflow::config::{CONFIG_FILE_NAME, ENV_API_TOKEN, ENV_API_URL, StratflowConfig, StratflowToml};

use super::super::ConfigCommands;

pub fn cmd_config(
    config: &StratflowConfig,
    explicit: Option<&Path>,
    command: Option<ConfigCommands>,
) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => show(config),
        Some(ConfigCommands::Validate) => validate(config),
        Some(ConfigCommands::Init) => init(explicit),
    }
}

fn show(config: &StratflowConfig) -> Result<()> {
    println!();
    println!("StratFlow Configuration");
    println!("=======================");
    println!();

    match &config.source {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("No {} found. Using default configuration.", CONFIG_FILE_NAME),
    }
    println!();

    let toml = &config.toml;
    println!("[api]");
    println!("  base_url = \"{}\"", toml.api.base_url);
    if toml.api.token.is_some() {
        println!("  token = \"********\"");
    }
    println!("  timeout_secs = {}", toml.api.timeout_secs);
    println!();

    println!("[board]");
    if let Some(board) = &toml.board.default_board {
        println!("  default_board = \"{}\"", board);
    }
    println!("  refetch_on_confirm = {}", toml.board.refetch_on_confirm);
    println!();

    println!("[logging]");
    println!("  level = \"{}\"", toml.logging.level);
    println!("  format = \"{}\"", toml.logging.format);
    println!();

    println!("Effective values (with env/CLI overrides):");
    println!("  api_url = \"{}\"", config.api_url());
    println!(
        "  token = {}",
        if config.api_token().is_some() { "set" } else { "unset" }
    );
    println!(
        "  board = {}",
        config.board_id().as_deref().unwrap_or("(none)")
    );
    println!("  log_level = \"{}\"", config.log_level());
    println!();
    println!("Environment overrides: {}, {}", ENV_API_URL, ENV_API_TOKEN);
    println!();
    Ok(())
}

fn validate(config: &StratflowConfig) -> Result<()> {
    println!();
    println!("Validating configuration...");
    println!();

    if config.source.is_none() {
        println!("No {} found. Using defaults (valid).", CONFIG_FILE_NAME);
        return Ok(());
    }

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration is valid.");
    } else {
        println!("Configuration warnings:");
        for warning in warnings {
            println!("  - {}", warning);
        }
    }
    println!();
    Ok(())
}

fn init(explicit: Option<&Path>) -> Result<()> {
    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if config_path.exists() {
        println!("{} already exists at {}", CONFIG_FILE_NAME, config_path.display());
        println!("Delete it first if you want to recreate it.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    StratflowToml::default().save(&config_path)?;

    println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
    println!();
    println!("You can now customize:");
    println!("  - [api] base_url, token, timeout_secs");
    println!("  - [board] default_board, refetch_on_confirm");
    println!("  - [logging] level, format");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_show_and_validate_succeed_without_config_file() {
        let config = StratflowConfig::default();
        assert!(cmd_config(&config, None, None).is_ok());
        assert!(cmd_config(&config, None, Some(ConfigCommands::Show)).is_ok());
        assert!(cmd_config(&config, None, Some(ConfigCommands::Validate)).is_ok());
    }

    #[test]
    fn test_validate_with_warnings_still_succeeds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[api]\nbase_url = \"ftp://boards\"\n").unwrap();
        let config = StratflowConfig {
            toml: StratflowToml::load(&path).unwrap(),
            source: Some(path),
            ..StratflowConfig::default()
        };
        assert!(!config.validate().is_empty());
        assert!(cmd_config(&config, None, Some(ConfigCommands::Validate)).is_ok());
    }

    #[test]
    fn test_init_writes_file_then_leaves_it_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = StratflowConfig::default();

        cmd_config(&config, Some(&path), Some(ConfigCommands::Init)).unwrap();
        assert!(path.exists());
        let written = std::fs::read_to_string(&path).unwrap();

        cmd_config(&config, Some(&path), Some(ConfigCommands::Init)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
    }
}
