//! Built-in prompt templates, template filling, and language directives.
//!
//! Templates use `{name}` placeholders that are replaced literally; any other
//! braces in a template are left alone.

use newsroom_core::candidate::{CandidateItem, CandidatePool, PoolKind};

/// Stage 1 placeholders: `{candidates}`, `{min_count}`, `{max_count}`, `{total}`.
pub const DEFAULT_SELECTION_TEMPLATE: &str = r#"You are a senior AI industry editor. Below are {total} recent news items, each tagged with an ID such as P-1 (primary sources) or R-1 (regional sources).

{candidates}

Select between {min_count} and {max_count} of the most important items for today's digest.

Selection criteria:
- Prioritize groundbreaking research, major product launches, significant policy changes, and large funding rounds
- Balance coverage across categories (LLMs, agents, research, products, policy)
- Include regional items when they are significant
- Prefer primary sources over secondary reporting
- Skip duplicates and near-duplicates

Respond with ONLY a JSON array of the selected IDs, most important first, for example: ["P-3", "R-1", "P-7"]"#;

/// Stage 2 placeholders: `{news_items}`, `{count}`.
pub const DEFAULT_ELABORATION_TEMPLATE: &str = r#"You are a senior AI industry analyst. Based on the following {count} selected news articles, create a comprehensive, in-depth news digest.

{news_items}

CONTENT DEPTH REQUIREMENTS:
- Each news summary should be 4-6 sentences
- Include: what happened, technical details, why it matters, potential implications
- Include specific numbers, metrics, and data when available
- Maintain accuracy - only include information from the provided articles

FORMATTING REQUIREMENTS:
- Format the output in clean, readable markdown with category headers
- Include source attributions as clickable markdown links: [Source Name](URL)
- Use the **Link:** field from each news item to create the clickable source link"#;

/// Topic mode placeholder: `{topics}`.
pub const DEFAULT_TOPIC_TEMPLATE: &str = r#"You are a senior AI industry analyst. Create a concise, well-organized digest of the most important recent developments on the following topics:

{topics}

For each item, explain what happened, why it matters, and cite the source when known. Format the output in clean, readable markdown with a header per topic."#;

pub const DEFAULT_TOPICS: &[&str] = &[
    "Large language model releases and updates",
    "AI agents and tool use",
    "AI research breakthroughs",
    "AI policy and regulation",
    "AI funding and industry moves",
];

/// Appended to the topic prompt when the web search tool is offered.
pub const WEB_SEARCH_INSTRUCTION: &str = "\n\nIMPORTANT: Use the web_search tool to find the most recent AI news. You can search 3-5 times with different queries to gather diverse news. After gathering news, create a comprehensive digest based on what you found.";

/// Description excerpt length in the Stage 2 item list.
const DESCRIPTION_LIMIT: usize = 300;
/// Description excerpt length in the Stage 1 candidate list.
const SELECTION_DESCRIPTION_LIMIT: usize = 200;

/// The language every template is written in; no directive is added for it.
pub const DEFAULT_LANGUAGE: &str = "en";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("zh", "Chinese (中文)"),
    ("es", "Spanish (Español)"),
    ("fr", "French (Français)"),
    ("ja", "Japanese (日本語)"),
    ("de", "German (Deutsch)"),
    ("ko", "Korean (한국어)"),
    ("pt", "Portuguese (Português)"),
    ("ru", "Russian (Русский)"),
    ("ar", "Arabic (العربية)"),
    ("hi", "Hindi (हिन्दी)"),
    ("it", "Italian (Italiano)"),
    ("nl", "Dutch (Nederlands)"),
];

/// Display name for a language code. Unknown codes are upper-cased.
pub fn language_name(code: &str) -> String {
    let code = code.trim().to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_uppercase())
}

/// The instruction appended to a prompt for non-default languages.
pub fn language_directive(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DEFAULT_LANGUAGE) {
        return None;
    }
    Some(format!(
        "\n\nIMPORTANT: Please respond entirely in {}.",
        language_name(trimmed)
    ))
}

/// Replace each `{key}` in `template` with its value.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{key}}}"), value)
        })
}

/// Cut `text` to at most `limit` characters on a char boundary.
fn excerpt(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

/// Render the pool as the Stage 1 candidate list, grouped by origin.
pub fn render_candidates(pool: &CandidatePool) -> String {
    let mut out = String::new();

    for (kind, heading) in [
        (PoolKind::Primary, "## Primary Sources"),
        (PoolKind::Regional, "## Regional Sources"),
    ] {
        let mut entries = pool.entries_of(kind).peekable();
        if entries.peek().is_none() {
            continue;
        }
        out.push_str(heading);
        out.push_str("\n\n");
        for entry in entries {
            out.push_str(&format!("[{}] {}\n", entry.key, entry.item.title));
            if !entry.item.source.is_empty() {
                out.push_str(&format!("Source: {}\n", entry.item.source));
            }
            if !entry.item.description.is_empty() {
                let (text, cut) = excerpt(&entry.item.description, SELECTION_DESCRIPTION_LIMIT);
                out.push_str(&format!("Summary: {text}{}\n", if cut { "..." } else { "" }));
            }
            out.push('\n');
        }
    }

    out.trim_end().to_string()
}

/// Render selected items as the Stage 2 markdown item list.
pub fn render_news_items<'a>(items: impl IntoIterator<Item = &'a CandidateItem>) -> String {
    let mut out = String::from("# Selected News Items\n\n");

    for (i, item) in items.into_iter().enumerate() {
        out.push_str(&format!("### {}. {}\n", i + 1, item.title));
        out.push_str(&format!("**Source:** {}\n", item.source));
        if !item.description.is_empty() {
            let (text, _) = excerpt(&item.description, DESCRIPTION_LIMIT);
            out.push_str(&format!("**Description:** {text}...\n"));
        }
        out.push_str(&format!("**Link:** {}\n", item.link));
        if let Some(published) = item.published_at.as_deref().filter(|p| !p.is_empty()) {
            out.push_str(&format!("**Published:** {published}\n"));
        }
        out.push('\n');
    }

    out
}

/// Render topics as a bulleted list.
pub fn render_topics<S: AsRef<str>>(topics: &[S]) -> String {
    topics
        .iter()
        .map(|t| format!("- {}", t.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsroom_core::candidate::CandidateBatch;

    fn item(title: &str, description: &str) -> CandidateItem {
        CandidateItem {
            id: String::new(),
            title: title.into(),
            source: "Lab Blog".into(),
            description: description.into(),
            link: "https://lab.test/post".into(),
            published_at: Some("2025-01-02".into()),
        }
    }

    #[test]
    fn language_names_from_table() {
        assert_eq!(language_name("zh"), "Chinese (中文)");
        assert_eq!(language_name("JA"), "Japanese (日本語)");
        assert_eq!(language_name("sv"), "SV");
    }

    #[test]
    fn no_directive_for_english() {
        assert!(language_directive("en").is_none());
        assert!(language_directive("EN").is_none());
        assert_eq!(
            language_directive("de").unwrap(),
            "\n\nIMPORTANT: Please respond entirely in German (Deutsch)."
        );
    }

    #[test]
    fn fill_replaces_all_occurrences() {
        let out = fill(
            "{a} and {a} then {b} but not {c}",
            &[("a", "x"), ("b", "y")],
        );
        assert_eq!(out, "x and x then y but not {c}");
    }

    #[test]
    fn candidates_grouped_with_keys() {
        let pool = CandidatePool::from_batch(CandidateBatch {
            primary: vec![item("Model launch", "A new model")],
            regional: vec![item("Local lab", "")],
        });
        let text = render_candidates(&pool);
        assert!(text.starts_with("## Primary Sources"));
        assert!(text.contains("[P-1] Model launch"));
        assert!(text.contains("## Regional Sources"));
        assert!(text.contains("[R-1] Local lab"));
        assert!(text.contains("Summary: A new model\n"));
    }

    #[test]
    fn news_items_truncate_on_char_boundary() {
        let long = "é".repeat(400);
        let items = [item("Title", &long)];
        let text = render_news_items(items.iter());
        let expected = format!("**Description:** {}...", "é".repeat(300));
        assert!(text.contains(&expected));
        assert!(text.contains("### 1. Title"));
        assert!(text.contains("**Published:** 2025-01-02"));
    }

    #[test]
    fn topics_as_bullets() {
        assert_eq!(render_topics(&["a", "b"]), "- a\n- b");
    }
}
