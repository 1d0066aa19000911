//! Create, update and reconcile systemd unit files.
//!
//! A unit file is read into a [`Document`](document::Document), an ordered,
//! case-sensitive, multi-valued key/value store. Updates merge the caller's
//! desired documents into the ones on disk with [`reconcile`], so only the
//! directives the caller sets change.

pub mod bundle;
pub mod document;
pub mod error;
pub mod kind;
pub mod location;
pub mod parser;
pub mod reconcile;
pub mod sections;
pub mod serializer;
pub mod systemd;
pub mod utils;

pub use bundle::{BundleOptions, RenderedUnit, UnitBundle};
pub use document::{Document, Section, UnitFiles, Value, ValueList};
pub use error::{Result, UnitError};
pub use kind::{RequirementHook, Schema, UnitKind};
pub use location::Location;
pub use parser::{parse, parse_file};
pub use reconcile::{reconcile, reconcile_files};
pub use serializer::{serialize, to_string};
