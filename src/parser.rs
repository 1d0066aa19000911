use log::{debug, trace};
use std::{fs, io, path::Path};

use crate::{
    document::Document,
    error::{Result, UnitError},
};

/// Parses unit file text.
///
/// Repeated sections are merged into the first occurrence and repeated keys
/// accumulate their values in file order. Everything from the first `#` that
/// is not preceded by a backslash is a comment, so a value cannot contain a
/// bare `#`. Lines starting with `;` are comments as well.
pub fn parse(text: &str) -> Result<Document> {
    let mut doc = Document::new();
    let mut current: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw).trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(name) = section_header(line) {
            trace!("line {}: section [{}]", idx + 1, name);
            doc.ensure_section(name);
            current = Some(name.to_string());
            continue;
        }

        let section = current
            .as_deref()
            .ok_or(UnitError::MissingSectionHeader { line: idx + 1 })?;

        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, ""),
        };
        doc.append(section, key, value);
    }

    Ok(doc)
}

/// Reads and parses a unit file. A missing file is an empty document.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(text) => parse(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} does not exist, using an empty document", path.display());
            Ok(Document::new())
        }
        Err(e) => Err(UnitError::io(path, e)),
    }
}

fn strip_comment(line: &str) -> &str {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' => {
                escaped = !escaped;
                continue;
            }
            '#' if !escaped => return &line[..i],
            _ => {}
        }
        escaped = false;
    }
    line
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}
