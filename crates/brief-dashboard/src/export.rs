use std::path::Path;

use anyhow::{Context, Result};
use brief_core::write_text_atomic;

use crate::ResultView;

/// Markdown rendering of an opened result, similar-case search applied.
pub fn render_markdown(view: &ResultView<'_>) -> String {
    let result = view.result;
    let mut lines = vec![
        format!("# {}", result.memo.title),
        String::new(),
        format!("_Generated on {}_", view.analysis.date),
        String::new(),
    ];
    for section in &result.memo.sections {
        lines.push(format!("## {}", section.title));
        lines.push(String::new());
        lines.push(section.content.trim_end().to_string());
        lines.push(String::new());
    }

    lines.push("## Summary".to_string());
    lines.push(String::new());
    lines.push(result.summary.trim_end().to_string());
    lines.push(String::new());

    lines.push("## Identified Laws".to_string());
    lines.push(String::new());
    lines.extend(
        result
            .identified_laws
            .iter()
            .map(|law| format!("- {}", law.name)),
    );
    lines.push(String::new());

    lines.push("## Similar Cases".to_string());
    lines.push(String::new());
    if view.similar_cases.is_empty() {
        lines.push(crate::NO_CASES_FOUND.to_string());
    }
    for case in &view.similar_cases {
        lines.push(format!("- **{}**: {}", case.name, case.summary));
    }

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}

pub fn export_markdown(view: &ResultView<'_>, path: &Path) -> Result<()> {
    write_text_atomic(path, &render_markdown(view))
        .with_context(|| format!("failed to export {} to {}", view.analysis.id, path.display()))
}
