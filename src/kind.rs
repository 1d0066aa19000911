use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};

use crate::{
    document::Document,
    error::{Result, UnitError},
};

/// The kind of a unit file, named by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Service,
    Socket,
    Target,
    Mount,
    Automount,
    Swap,
    Path,
    Timer,
    Device,
    Slice,
    Scope,
}

impl UnitKind {
    pub const ALL: [UnitKind; 11] = [
        UnitKind::Service,
        UnitKind::Socket,
        UnitKind::Target,
        UnitKind::Mount,
        UnitKind::Automount,
        UnitKind::Swap,
        UnitKind::Path,
        UnitKind::Timer,
        UnitKind::Device,
        UnitKind::Slice,
        UnitKind::Scope,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            UnitKind::Service => "service",
            UnitKind::Socket => "socket",
            UnitKind::Target => "target",
            UnitKind::Mount => "mount",
            UnitKind::Automount => "automount",
            UnitKind::Swap => "swap",
            UnitKind::Path => "path",
            UnitKind::Timer => "timer",
            UnitKind::Device => "device",
            UnitKind::Slice => "slice",
            UnitKind::Scope => "scope",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.extension() == ext)
    }

    // Get kind from a unit file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        Self::from_extension(ext)
    }

    /// `{name}.{extension}`, e.g. `backup.timer`.
    pub fn file_name(self, name: &str) -> String {
        format!("{}.{}", name, self.extension())
    }

    pub fn required_sections(self) -> &'static [&'static str] {
        match self {
            UnitKind::Service => &["Unit", "Service", "Install"],
            UnitKind::Socket => &["Unit", "Socket", "Install"],
            UnitKind::Target => &["Unit", "Install"],
            UnitKind::Mount => &["Unit", "Mount", "Install"],
            UnitKind::Automount => &["Unit", "Automount"],
            UnitKind::Swap => &["Unit", "Swap", "Install"],
            UnitKind::Path => &["Unit", "Path", "Install"],
            UnitKind::Timer => &["Unit", "Timer", "Install"],
            UnitKind::Device | UnitKind::Slice | UnitKind::Scope => &["Unit"],
        }
    }

    pub fn allowed_sections(self) -> &'static [&'static str] {
        match self {
            UnitKind::Slice => &["Unit", "Slice"],
            kind => kind.required_sections(),
        }
    }

    pub fn is_allowed(self, section: &str) -> bool {
        self.allowed_sections().iter().any(|s| *s == section)
    }

    pub fn check_requirements(self, doc: &Document) -> Result<()> {
        check_requirements(&Schema, self, doc)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Decides which sections a unit kind needs and accepts.
pub trait RequirementHook {
    fn required_sections(&self, kind: UnitKind) -> Vec<String>;
    fn is_allowed(&self, kind: UnitKind, section: &str) -> bool;
}

/// The systemd section tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Schema;

impl RequirementHook for Schema {
    fn required_sections(&self, kind: UnitKind) -> Vec<String> {
        kind.required_sections().iter().map(|s| s.to_string()).collect()
    }

    fn is_allowed(&self, kind: UnitKind, section: &str) -> bool {
        kind.is_allowed(section)
    }
}

pub fn check_requirements(hook: &dyn RequirementHook, kind: UnitKind, doc: &Document) -> Result<()> {
    for section in hook.required_sections(kind) {
        if !doc.contains_section(&section) {
            return Err(UnitError::MissingRequiredSection { section, kind });
        }
    }
    Ok(())
}
