//! Configuration commands: `config show`, `config init`, `config path`.

use std::path::Path;

use owo_colors::OwoColorize;

use crate::config::Config;
use crate::error::{DropwatchError, Result};

/// Print the resolved configuration as YAML.
pub fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = crate::config::resolve(config_path, None)?;
    let yaml = serde_yaml_ng::to_string(&config)?;
    println!("{}", "Configuration:".cyan().bold());
    println!();
    print!("{yaml}");
    Ok(())
}

/// Write a default configuration for the given root.
pub fn cmd_config_init(config_path: Option<&Path>, root: &Path, force: bool) -> Result<()> {
    let target = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };

    if target.exists() && !force {
        return Err(DropwatchError::Config(format!(
            "config file already exists at {} (pass --force to overwrite)",
            target.display()
        )));
    }

    let config = Config::for_root(root);
    config.save(&target)?;
    println!("Wrote {}", target.display().to_string().green());
    Ok(())
}

/// Print the default configuration file location.
pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::default_path()?.display());
    Ok(())
}
