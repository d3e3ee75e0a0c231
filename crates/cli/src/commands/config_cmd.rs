//! `newsroom config`: Configuration management commands.

use std::path::Path;

use newsroom_config::AppConfig;
use newsroom_providers::ProviderKind;

/// Problems that do not stop loading but will stop a digest run.
fn warnings(config: &AppConfig, env: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut warnings = Vec::new();

    match config.llm.provider.parse::<ProviderKind>() {
        Ok(kind) => {
            let has_key = config.llm.api_key.is_some()
                || env(kind.api_key_env()).is_some_and(|v| !v.trim().is_empty());
            if !has_key {
                warnings.push(format!(
                    "No API key for '{kind}' (set {} or [llm] api_key)",
                    kind.api_key_env()
                ));
            }
        }
        Err(e) => warnings.push(e.to_string()),
    }

    if config.search.enabled && config.search.max_searches == 0 {
        warnings.push("Web search enabled with search.max_searches = 0".into());
    }

    warnings
}

pub fn validate(config: &AppConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating {}", path.display());
    println!("   Config parsed successfully");

    let warnings = warnings(config, |key| std::env::var(key).ok());
    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Provider:   {}", config.llm.provider);
    println!(
        "   Model:      {}",
        config.llm.model.as_deref().unwrap_or("(backend default)")
    );
    println!(
        "   Selection:  {}-{} items",
        config.pipeline.min_selected, config.pipeline.max_selected
    );
    println!("   Retries:    {}", config.pipeline.max_retries);
    println!("   Languages:  {}", config.pipeline.languages.join(", "));
    println!(
        "   Web search: {}",
        if config.search.enabled { "enabled" } else { "disabled" }
    );

    Ok(())
}

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", config.to_toml());
    Ok(())
}

pub fn path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", path.display());
    Ok(())
}

pub fn init(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
