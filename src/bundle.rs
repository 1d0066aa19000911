use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    document::{Document, UnitFiles},
    error::{Result, UnitError},
    kind::{RequirementHook, Schema, UnitKind},
    location::Location,
    parser::parse_file,
    reconcile::reconcile_files,
    sections::{field_by_key, known_fields, SectionRecord},
    serializer::serialize,
    systemd::ServiceManager,
    utils::write_atomic,
};

static UNIT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9:_.@-]+$").expect("unit name pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleOptions {
    /// Restart the units after writing them.
    pub auto_start: bool,
    pub enable_at_startup: bool,
    /// Let `create` replace files that already exist.
    pub force_overwrite: bool,
    /// Fail rendering when a kind's required sections are missing.
    pub require_sections: bool,
    /// Run `systemd-analyze verify` on every written file.
    pub verify: bool,
}

impl Default for BundleOptions {
    fn default() -> Self {
        BundleOptions {
            auto_start: true,
            enable_at_startup: false,
            force_overwrite: false,
            require_sections: false,
            verify: false,
        }
    }
}

/// One rendered unit file, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedUnit {
    pub kind: UnitKind,
    pub path: PathBuf,
    pub text: String,
}

impl RenderedUnit {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// All unit files sharing one name (`web.service`, `web.timer`, ...) in one
/// location, together with the state the caller wants them to have.
#[derive(Debug, Clone)]
pub struct UnitBundle {
    name: String,
    location: Location,
    options: BundleOptions,
    desired: UnitFiles,
}

impl UnitBundle {
    pub fn new(name: impl Into<String>, location: Location, options: BundleOptions) -> Result<Self> {
        let name = name.into();
        if !UNIT_NAME.is_match(&name) {
            return Err(UnitError::InvalidUnitName { name });
        }

        Ok(UnitBundle {
            name,
            location,
            options,
            desired: UnitFiles::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    pub fn directory(&self) -> PathBuf {
        self.location.directory()
    }

    pub fn path(&self, kind: UnitKind) -> PathBuf {
        self.directory().join(kind.file_name(&self.name))
    }

    pub fn desired(&self) -> &UnitFiles {
        &self.desired
    }

    /// The desired document for `kind`, created empty on first use.
    pub fn file_mut(&mut self, kind: UnitKind) -> &mut Document {
        self.desired.0.entry(kind).or_default()
    }

    /// Sets every field the record defines. Fields left as `None` keep
    /// whatever the desired document already holds.
    pub fn set_record<R: SectionRecord>(&mut self, kind: UnitKind, record: &R) -> Result<()> {
        if !kind.is_allowed(R::NAME) {
            return Err(UnitError::SectionNotAllowed {
                section: R::NAME.to_string(),
                kind,
            });
        }
        let fields = record.to_section();
        if fields.is_empty() {
            return Ok(());
        }
        let section = self.file_mut(kind).ensure_section(R::NAME);
        for (key, values) in fields.iter() {
            section.set(key, values.clone());
        }
        Ok(())
    }

    /// Adds a whole desired document for `kind`, replacing any earlier one.
    pub fn insert_document(&mut self, kind: UnitKind, doc: Document) -> Result<()> {
        for (name, section) in doc.iter() {
            if !kind.is_allowed(name) {
                return Err(UnitError::SectionNotAllowed {
                    section: name.to_string(),
                    kind,
                });
            }
            if known_fields(name).is_some() {
                for key in section.keys() {
                    if field_by_key(name, key).is_none() {
                        warn!("Unknown directive {}= in [{}] of {}", key, name, kind.file_name(&self.name));
                    }
                }
            }
        }
        self.desired.insert(kind, doc);
        Ok(())
    }

    pub fn insert_files(&mut self, files: UnitFiles) -> Result<()> {
        for (kind, doc) in files.0 {
            self.insert_document(kind, doc)?;
        }
        Ok(())
    }

    /// Regular files in the bundle's directory named `{name}.{ext}`, sorted.
    /// Files of other units sharing the prefix (`web.zzz.service` for `web`)
    /// and drop-in directories (`web.service.d`) are not part of the bundle.
    pub fn existing_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.directory();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(UnitError::io(dir, e)),
        };

        let prefix = format!("{}.", self.name);
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| UnitError::io(&dir, e))?;
            let file_name = entry.file_name();
            let owned = match file_name.to_string_lossy().strip_prefix(&prefix) {
                Some(ext) => !ext.is_empty() && !ext.contains('.'),
                None => false,
            };
            if !owned {
                continue;
            }
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            } else {
                debug!("Skipping {}: not a regular file", path.display());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Parses the bundle's file of every known kind that exists on disk.
    pub fn load_existing(&self) -> Result<UnitFiles> {
        let mut files = UnitFiles::new();
        for kind in UnitKind::ALL.iter().copied() {
            let path = self.path(kind);
            if path.is_file() {
                debug!("Loading {}", path.display());
                files.insert(kind, parse_file(&path)?);
            }
        }
        for path in self.existing_files()? {
            if UnitKind::from_path(&path).is_none() {
                warn!("Skipping {}: not a unit file", path.display());
            }
        }
        Ok(files)
    }

    /// Serializes `files` in memory. Empty documents are not rendered.
    pub fn render(&self, files: &UnitFiles) -> Result<Vec<RenderedUnit>> {
        let mut rendered = Vec::new();
        for (kind, doc) in files.0.iter() {
            if doc.is_empty() {
                continue;
            }
            let text = if self.options.require_sections {
                serialize(doc, Some((&Schema as &dyn RequirementHook, *kind)))?
            } else {
                serialize(doc, None)?
            };
            rendered.push(RenderedUnit {
                kind: *kind,
                path: self.path(*kind),
                text,
            });
        }
        Ok(rendered)
    }

    /// Writes the bundle, failing if any of its files already exist unless
    /// `force_overwrite` is set.
    pub fn create(&self, manager: &dyn ServiceManager) -> Result<Vec<RenderedUnit>> {
        let existing = self.existing_files()?;
        if !existing.is_empty() && !self.options.force_overwrite {
            return Err(UnitError::UnitsExist {
                name: self.name.clone(),
                files: existing.iter().map(|p| file_name(p)).collect(),
            });
        }
        self.replace(manager)
    }

    /// Deletes every existing file of the bundle and writes only the desired
    /// documents.
    pub fn replace(&self, manager: &dyn ServiceManager) -> Result<Vec<RenderedUnit>> {
        self.write(&self.desired, manager)
    }

    /// Merges the desired documents into the files on disk. Directives the
    /// desired state does not mention are kept.
    pub fn update(&self, manager: &dyn ServiceManager) -> Result<Vec<RenderedUnit>> {
        if self.existing_files()?.is_empty() {
            return Err(UnitError::NoExistingUnits {
                name: self.name.clone(),
            });
        }
        let existing = self.load_existing()?;
        let merged = reconcile_files(&existing, &self.desired);
        self.write(&merged, manager)
    }

    pub fn delete(&self) -> Result<()> {
        for path in self.existing_files()? {
            fs::remove_file(&path).map_err(|e| UnitError::io(&path, e))?;
            info!("Deleted {}", path.display());
        }
        Ok(())
    }

    pub fn status(&self, manager: &dyn ServiceManager) -> Result<()> {
        manager.status(&self.name)
    }

    fn write(&self, files: &UnitFiles, manager: &dyn ServiceManager) -> Result<Vec<RenderedUnit>> {
        // nothing is deleted or written unless every file renders
        let rendered = self.render(files)?;

        self.delete()?;
        for unit in &rendered {
            write_atomic(&unit.path, &unit.text)?;
            info!("Wrote {}", unit.path.display());
            if self.options.verify {
                manager.verify(&unit.path)?;
            }
        }

        manager.daemon_reload()?;
        let units = activation_units(&rendered);
        if self.options.auto_start {
            for unit in &units {
                manager.restart(unit)?;
            }
        }
        if self.options.enable_at_startup {
            for unit in &units {
                manager.enable(unit)?;
            }
        }
        Ok(rendered)
    }
}

/// Units to start or enable. When a trigger unit (timer, socket, path,
/// automount) is present it activates the rest, so only triggers are returned.
fn activation_units(rendered: &[RenderedUnit]) -> Vec<String> {
    let is_trigger = |kind: UnitKind| {
        matches!(
            kind,
            UnitKind::Timer | UnitKind::Socket | UnitKind::Path | UnitKind::Automount
        )
    };
    let startable = |kind: UnitKind| {
        !matches!(kind, UnitKind::Device | UnitKind::Slice | UnitKind::Scope)
    };

    let has_trigger = rendered.iter().any(|u| is_trigger(u.kind));
    rendered
        .iter()
        .filter(|u| startable(u.kind) && (!has_trigger || is_trigger(u.kind)))
        .map(RenderedUnit::file_name)
        .collect()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
