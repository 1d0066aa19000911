use anyhow::{Context, Result};
use std::{
    fs,
    io::{IsTerminal, Write},
    os::unix::fs::PermissionsExt,
    path::Path,
};
use tempfile::NamedTempFile;

use crate::{bundle::RenderedUnit, error::UnitError};

/// Writes `contents` to a temporary file next to `path` and renames it into
/// place, so readers never observe a half-written unit.
pub fn write_atomic(path: &Path, contents: &str) -> crate::error::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| UnitError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| UnitError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| UnitError::io(tmp.path(), e))?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(|e| UnitError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| UnitError::io(path, e.error))?;
    Ok(())
}

pub fn print_files(units: &[RenderedUnit]) {
    let len = units.len();
    for (i, unit) in units.iter().enumerate() {
        print!("# {}\n{}", unit.file_name(), unit.text);
        if i + 1 < len {
            println!("\n---\n");
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

pub fn ask_confirm(prompt: &str, default: bool) -> Result<bool> {
    if !is_interactive() {
        return Ok(default);
    }
    demand::Confirm::new(prompt)
        .affirmative("Yes")
        .negative("No")
        .selected(default)
        .run()
        .with_context(|| format!("Failed to read answer for: {}", prompt))
}
