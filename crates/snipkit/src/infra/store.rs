//! Reading and writing snippet files.
//!
//! A snippet file is plain UTF-8 text with a fixed shape: a description
//! header, a hotkey header, then the body verbatim. Each header starts with
//! a single marker character (conventionally `#`) that is stripped and
//! otherwise ignored.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::keyseq::KeySequence;
use crate::domain::model::SnippetRecord;

/// Parse the snippet at `path`.
///
/// Never fails: unreadable, undecodable, or too-short files all come back as
/// [`SnippetRecord::empty`], logged at debug level only. Callers treat the
/// empty record as "nothing to register".
pub fn parse_snippet(path: &Path) -> SnippetRecord {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "unreadable snippet");
            return SnippetRecord::empty();
        }
    };
    let record = parse_snippet_text(&content);
    if record.is_empty() {
        tracing::debug!(path = %path.display(), "file too short to be a snippet");
    }
    record
}

/// Parse snippet text that has already been read.
///
/// Lines are counted the way the file stores them, so `"a\nb\n"` is two
/// lines and inert, while `"a\nb\nc"` is three and real.
pub fn parse_snippet_text(content: &str) -> SnippetRecord {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    if lines.len() < 3 {
        return SnippetRecord::empty();
    }

    let description = strip_marker(lines[0]).trim();
    let description = (!description.is_empty()).then(|| description.to_owned());
    let hotkey = strip_marker(lines[1]).parse::<KeySequence>().ok();
    let body = lines[2..].concat();

    SnippetRecord {
        description,
        hotkey,
        body,
    }
}

/// Write a snippet so that parsing it back yields the same triple.
pub fn save_snippet(
    path: &Path,
    description: Option<&str>,
    hotkey: Option<&KeySequence>,
    body: &str,
) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create snippet directory {}", parent.display()))?;
    }

    let mut content = String::new();
    content.push('#');
    content.push_str(description.unwrap_or(""));
    content.push('\n');
    content.push('#');
    if let Some(hotkey) = hotkey {
        content.push_str(&hotkey.to_string());
    }
    content.push('\n');
    content.push_str(body);

    fs::write(path, content)
        .with_context(|| format!("failed to write snippet to {}", path.display()))
}

/// Trim the line, drop the leading marker character, and return the rest.
fn strip_marker(line: &str) -> &str {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    chars.next();
    chars.as_str()
}
