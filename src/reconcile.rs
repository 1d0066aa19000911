use crate::document::{Document, UnitFiles};

/// Merges a desired document into an existing one.
///
/// Sections of `existing` come first in their original order, followed by
/// sections only `desired` has. Inside a shared section, a key present in
/// `desired` takes its whole value list from `desired`; every other key is
/// carried over from `existing`. Neither input is modified.
pub fn reconcile(existing: &Document, desired: &Document) -> Document {
    let mut merged = existing.clone();
    for (name, section) in desired.iter() {
        let target = merged.ensure_section(name);
        for (key, values) in section.iter() {
            target.set(key, values.clone());
        }
    }
    merged
}

/// Reconciles whole unit bundles kind by kind. Kinds only one side has are
/// taken as they are.
pub fn reconcile_files(existing: &UnitFiles, desired: &UnitFiles) -> UnitFiles {
    let mut merged = UnitFiles::new();
    for (kind, doc) in existing.0.iter() {
        let doc = match desired.get(*kind) {
            Some(wanted) => reconcile(doc, wanted),
            None => doc.clone(),
        };
        merged.insert(*kind, doc);
    }
    for (kind, doc) in desired.0.iter() {
        if !merged.0.contains_key(kind) {
            merged.insert(*kind, doc.clone());
        }
    }
    merged
}
