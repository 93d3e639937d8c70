use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::report::EvaluationItem;

/// The fixed slot set a grading template can draw from.
pub const SLOT_QUESTION: &str = "{{question}}";
pub const SLOT_REFERENCE_ANSWER: &str = "{{reference_answer}}";
pub const SLOT_MODEL_ANSWER: &str = "{{model_answer}}";

const SLOTS: [&str; 3] =
    [SLOT_QUESTION, SLOT_REFERENCE_ANSWER, SLOT_MODEL_ANSWER];

/// Task type label -> grading template body.
pub type TemplateMap = HashMap<String, String>;

/// Parse the Markdown prompt file into a template map.
///
/// Each section starts with a `# type <names>` header line; the body runs
/// until the next header or end of file. A header may carry several names
/// separated by `,` or `、`, all of which share the section body, e.g.
///
/// ```markdown
/// # type Mnestic Trigger Analysis、Temporal Reasoning
/// Score the answer ... {{question}} ... {{model_answer}}
/// ```
///
/// Templates missing one of the placeholder slots are loaded anyway; the gap
/// is reported as a warning here so it is visible before any judge call.
pub fn parse_prompt_file(path: &Path) -> Result<TemplateMap> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Prompt file not found: {}",
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("Failed to read prompt file {}: {}", path.display(), e)
    })?;

    let header =
        Regex::new(r"(?m)^# type\s+(.+)$").expect("header pattern is valid");

    // (header start, body start, raw names) for every section.
    let sections: Vec<(usize, usize, &str)> = header
        .captures_iter(&content)
        .map(|caps| {
            let whole = caps.get(0).expect("whole match");
            let names = caps.get(1).expect("names group");
            (whole.start(), whole.end(), names.as_str())
        })
        .collect();

    let mut templates = TemplateMap::new();
    for (idx, (_, body_start, names_raw)) in sections.iter().enumerate() {
        let body_end = sections
            .get(idx + 1)
            .map(|next| next.0)
            .unwrap_or(content.len());
        let body = content[*body_start..body_end].trim().to_string();

        let missing = missing_slots(&body);
        if !missing.is_empty() {
            warn!(
                "Template for '{}' is missing placeholder slots: {}",
                names_raw.trim(),
                missing.join(", ")
            );
        }

        for name in names_raw
            .split(['、', ','])
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            templates.insert(name.to_string(), body.clone());
        }
    }

    println!(
        "Loaded {} prompt templates from {}",
        templates.len(),
        path.display()
    );
    Ok(templates)
}

/// Slots absent from a template body. Rendering tolerates these; the parser
/// only warns about them.
pub fn missing_slots(template: &str) -> Vec<&'static str> {
    SLOTS
        .iter()
        .copied()
        .filter(|slot| !template.contains(slot))
        .collect()
}

/// Fill the three placeholder slots with the item's text. Rendering never
/// fails: missing item fields become empty strings, and unknown tokens in
/// the template are left as literal text.
pub fn render(template: &str, item: &EvaluationItem) -> String {
    template
        .replace(SLOT_QUESTION, &slot_text(&item.question))
        .replace(SLOT_REFERENCE_ANSWER, &slot_text(&item.reference_answer))
        .replace(SLOT_MODEL_ANSWER, &slot_text(&item.model_answer))
}

fn slot_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
