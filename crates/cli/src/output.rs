//! Hand-off of finished digests: stdout, or one markdown file per language.

use std::path::{Path, PathBuf};

use newsroom_pipeline::Digest;
use tracing::info;

/// `digest-{date}-{language}.md`
pub fn file_name(kind: &str, date: &str, language: &str) -> String {
    format!("{kind}-{date}-{language}.md")
}

/// Print `digest`, or write it under `output_dir` and return the path.
pub fn emit(
    digest: &Digest,
    kind: &str,
    output_dir: Option<&Path>,
) -> Result<Option<PathBuf>, std::io::Error> {
    let Some(dir) = output_dir else {
        println!("{}", digest.text);
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let path = dir.join(file_name(kind, &date, &digest.language));
    std::fs::write(&path, &digest.text)?;
    info!(path = %path.display(), language = %digest.language, "Digest written");
    Ok(Some(path))
}
