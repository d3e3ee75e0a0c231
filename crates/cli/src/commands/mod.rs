pub mod config_cmd;
pub mod digest;
pub mod providers;
pub mod topics;

use newsroom_config::{AppConfig, parse_language_list};

/// Languages from the command line, else from configuration.
pub(crate) fn resolve_languages(config: &AppConfig, from_cli: &[String]) -> Vec<String> {
    let parsed = parse_language_list(&from_cli.join(","));
    if parsed.is_empty() {
        config.pipeline.languages.clone()
    } else {
        parsed
    }
}
