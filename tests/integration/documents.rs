use anyhow::Result;
use std::fs;
use tempfile::tempdir;
use unitforge::{
    parse, parse_file, reconcile, to_string, Document, UnitError, Value, ValueList,
};

fn doc(text: &str) -> Document {
    parse(text).expect("valid unit text")
}

#[test]
fn test_round_trip_through_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sync.service");

    let mut original = Document::new();
    original.append("Unit", "Description", "Sync notes");
    original.append("Unit", "After", "network-online.target");
    original.append("Unit", "Wants", "network-online.target");
    original.append("Service", "Environment", "A=1");
    original.append("Service", "Environment", "B=2");
    original.append("Service", "ExecStart", "/bin/zsh -c 'cron.sh; sync.zsh;'");
    original.append("Service", "RemainAfterExit", false);
    original.append("Install", "WantedBy", "default.target");

    fs::write(&path, to_string(&original))?;
    let reread = parse_file(&path)?;

    assert_eq!(reread, original);
    assert_eq!(reread.sections().collect::<Vec<_>>(), vec!["Unit", "Service", "Install"]);
    assert_eq!(
        reread.get("Service", "Environment")?.as_slice(),
        &[Value::from("A=1"), Value::from("B=2")]
    );

    dir.close()?;
    Ok(())
}

#[test]
fn test_reconcile_example() {
    let existing = doc(
        "[Service]\nType=simple\nExecStart=/bin/a\n[Install]\nWantedBy=multi-user.target\n",
    );
    let desired = doc("[Service]\nExecStart=/bin/b\n");

    let merged = reconcile(&existing, &desired);

    assert_eq!(
        merged,
        doc("[Service]\nType=simple\nExecStart=/bin/b\n[Install]\nWantedBy=multi-user.target\n")
    );
}

#[test]
fn test_reconcile_keeps_sections_desired_never_mentions() {
    let existing = doc(
        "# written by an earlier run\n[Unit]\nDescription=old\n\n[Timer]\nOnCalendar=daily  # every day\nPersistent=true\n",
    );
    let desired = doc("[Unit]\nDescription=new\n[Service]\nType=oneshot\n");

    let merged = reconcile(&existing, &desired);

    assert_eq!(
        to_string(&merged),
        "[Unit]\nDescription=new\n\n[Timer]\nOnCalendar=daily\nPersistent=true\n\n[Service]\nType=oneshot\n"
    );
}

#[test]
fn test_parse_errors_surface_through_files() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.service");
    fs::write(&path, "\nDescription=orphan\n[Unit]\n")?;

    match parse_file(&path) {
        Err(UnitError::MissingSectionHeader { line }) => assert_eq!(line, 2),
        other => panic!("unexpected: {:?}", other),
    }

    let absent = parse_file(dir.path().join("absent.service"))?;
    assert_eq!(absent.len(), 0);

    dir.close()?;
    Ok(())
}

#[test]
fn test_lookup_with_fallback() {
    let d = doc("[Unit]\nDescription=x\n");
    let fallback = ValueList::single("fallback");

    assert_eq!(d.get_or("Install", "WantedBy", &fallback), &fallback);
    assert!(d.get("Install", "WantedBy").is_err());
    assert_eq!(d.get("Unit", "Description").map(ValueList::joined).ok(), Some("x".to_string()));
}
