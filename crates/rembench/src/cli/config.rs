//! The `rembench config` command for configuration management.

use clap::{Args, Subcommand};
use rembench_core::config::resolve_env_var;
use rembench_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration and credential status
    Show,

    /// Show the config file path
    Path,

    /// Write a default config file to the standard location
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show(),
        ConfigCommand::Path => path(),
        ConfigCommand::Init { force } => init(force),
    }
}

fn show() -> anyhow::Result<()> {
    let config = Config::load()?;
    println!("{}", config.to_toml()?);

    // Report whether credentials resolve without echoing their values.
    let replicate = resolve_env_var(&config.replicate.api_token).is_some();
    println!("# replicate token: {}", credential_status(replicate));
    let (label, resolved) = vision_credential(&config);
    println!("# vision ({label}): {}", credential_status(resolved));
    println!(
        "# catalog: {} provider(s), vision backend: {}",
        config.providers.catalog.len(),
        config.vision.provider
    );
    Ok(())
}

fn path() -> anyhow::Result<()> {
    let path = Config::default_path();
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!(
            "{} (not created yet; run `rembench config init`)",
            path.display()
        );
    }
    Ok(())
}

fn init(force: bool) -> anyhow::Result<()> {
    let path = Config::default_path();
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Pass --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, Config::default().to_toml()?)?;

    tracing::info!("Config file created at {}", path.display());
    println!("Wrote default configuration to {}", path.display());
    println!("Edit [providers] to change which models `rembench compare` fans out to.");
    Ok(())
}

/// The credential the configured vision backend needs, and whether it
/// currently resolves.
fn vision_credential(config: &Config) -> (&'static str, bool) {
    match config.vision.provider.as_str() {
        "gemini" => (
            "gemini key",
            resolve_env_var(&config.vision.gemini.clone().unwrap_or_default().api_key).is_some(),
        ),
        "anthropic" => (
            "anthropic key",
            resolve_env_var(&config.vision.anthropic.clone().unwrap_or_default().api_key)
                .is_some(),
        ),
        // The replicate backend reuses the removal-provider token
        _ => (
            "replicate token",
            resolve_env_var(&config.replicate.api_token).is_some(),
        ),
    }
}

fn credential_status(resolved: bool) -> &'static str {
    if resolved {
        "resolved"
    } else {
        "missing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rembench_core::config::GeminiConfig;

    #[test]
    fn test_vision_credential_follows_backend_selection() {
        let mut config = Config::default();
        config.replicate.api_token = "r8_literal".to_string();
        let (label, resolved) = vision_credential(&config);
        assert_eq!(label, "replicate token");
        assert!(resolved);

        config.vision.provider = "gemini".to_string();
        config.vision.gemini = Some(GeminiConfig {
            api_key: "g_literal".to_string(),
            model: "gemini-1.5-flash".to_string(),
        });
        let (label, resolved) = vision_credential(&config);
        assert_eq!(label, "gemini key");
        assert!(resolved);
    }

    #[test]
    fn test_vision_credential_reports_unset_env_reference() {
        let mut config = Config::default();
        config.vision.provider = "anthropic".to_string();
        config.vision.anthropic = Some(rembench_core::config::AnthropicConfig {
            api_key: "${DEFINITELY_NOT_SET_XYZ_123}".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
        });
        let (label, resolved) = vision_credential(&config);
        assert_eq!(label, "anthropic key");
        assert!(!resolved);
        assert_eq!(credential_status(resolved), "missing");
    }
}
