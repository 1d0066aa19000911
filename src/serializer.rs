use std::fmt::Write;

use crate::{
    document::Document,
    error::Result,
    kind::{check_requirements, RequirementHook, UnitKind},
};

/// Renders a document as unit file text.
///
/// Every value of a key becomes its own `Key=value` line. Sections are
/// separated by a blank line.
pub fn to_string(doc: &Document) -> String {
    let mut out = String::new();
    for (i, (name, section)) in doc.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // writing into a String cannot fail
        let _ = writeln!(out, "[{}]", name);
        for (key, values) in section.iter() {
            for value in values {
                let _ = writeln!(out, "{}={}", key, value);
            }
        }
    }
    out
}

/// Like [`to_string`], but first checks that `doc` has every section the
/// hook requires for `kind`.
pub fn serialize(doc: &Document, requirements: Option<(&dyn RequirementHook, UnitKind)>) -> Result<String> {
    if let Some((hook, kind)) = requirements {
        check_requirements(hook, kind, doc)?;
    }
    Ok(to_string(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        document::{Value, ValueList},
        error::UnitError,
        kind::Schema,
        parser::parse,
    };

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.append("Unit", "Description", "A test service");
        doc.append("Unit", "After", "network.target");
        doc.append("Unit", "After", "time-sync.target");
        doc.append("Service", "ExecStart", "/bin/echo 'Hello'");
        doc.append("Service", "RemainAfterExit", true);
        doc.append("Install", "WantedBy", "multi-user.target");
        doc
    }

    #[test]
    fn renders_repeated_keys_and_booleans() {
        insta::assert_snapshot!(to_string(&sample()), @r"
[Unit]
Description=A test service
After=network.target
After=time-sync.target

[Service]
ExecStart=/bin/echo 'Hello'
RemainAfterExit=true

[Install]
WantedBy=multi-user.target
");
    }

    #[test]
    fn booleans_are_lowercase() {
        let mut doc = Document::new();
        doc.set("Timer", "Persistent", Value::Bool(false));
        doc.set("Timer", "WakeSystem", Value::Bool(true));
        assert_eq!(to_string(&doc), "[Timer]\nPersistent=false\nWakeSystem=true\n");
    }

    #[test]
    fn empty_document() {
        assert_eq!(to_string(&Document::new()), "");
    }

    #[test]
    fn round_trip() {
        let doc = sample();
        let parsed = parse(&to_string(&doc)).unwrap();
        assert_eq!(parsed, doc);

        let sections: Vec<_> = parsed.sections().collect();
        assert_eq!(sections, vec!["Unit", "Service", "Install"]);
        assert_eq!(parsed.get("Unit", "After").unwrap().len(), 2);
    }

    #[test]
    fn requirement_check() {
        let mut doc = sample();
        doc.remove_section("Install");

        assert!(serialize(&doc, None).is_ok());
        match serialize(&doc, Some((&Schema as &dyn RequirementHook, UnitKind::Service))) {
            Err(UnitError::MissingRequiredSection { section, kind }) => {
                assert_eq!(section, "Install");
                assert_eq!(kind, UnitKind::Service);
            }
            other => panic!("unexpected: {:?}", other),
        }

        doc.set("Install", "WantedBy", ValueList::single("default.target"));
        assert!(serialize(&doc, Some((&Schema as &dyn RequirementHook, UnitKind::Service))).is_ok());
    }
}
