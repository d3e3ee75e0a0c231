//! `newsroom providers`: List supported LLM providers.

use newsroom_config::AppConfig;
use newsroom_providers::ProviderKind;

/// One table row: name, default model, key variable, key status, active marker.
fn row(kind: ProviderKind, active: &str, key_set: bool) -> String {
    format!(
        "  {} {:<10} {:<28} {:<20} {}",
        if kind.as_str() == active { "*" } else { " " },
        kind.as_str(),
        kind.default_model(),
        kind.api_key_env(),
        if key_set { "set" } else { "missing" },
    )
}

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Supported LLM Providers");
    println!("=======================");
    println!();
    println!(
        "    {:<10} {:<28} {:<20} {}",
        "Provider", "Default model", "API key variable", "Key"
    );
    for kind in ProviderKind::ALL {
        let key_set = std::env::var(kind.api_key_env()).is_ok_and(|v| !v.trim().is_empty());
        println!("{}", row(kind, &config.llm.provider, key_set));
    }
    println!();
    println!("  * = configured provider ([llm] provider or LLM_PROVIDER)");
    println!("  Override the model with [llm] model or LLM_MODEL.");

    Ok(())
}
