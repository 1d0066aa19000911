use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn unitforge() -> Result<Command> {
    let mut cmd = Command::cargo_bin("unitforge")?;
    cmd.env("RUST_LOG", "warn");
    Ok(cmd)
}

const WEB_YAML: &str = r#"
service:
  Unit:
    Description: "Web server"
  Service:
    Type: simple
    ExecStart: "/usr/bin/web --port 8080"
    Restart: always
  Install:
    WantedBy: multi-user.target
timer:
  Timer:
    OnCalendar: "*:7/15"
    Persistent: true
"#;

#[test]
fn test_empty_yaml_input() -> Result<()> {
    let dir = tempdir()?;
    let input_path = dir.path().join("input.yaml");
    fs::write(&input_path, "{}")?;

    unitforge()?
        .arg("render")
        .arg("web")
        .arg(&input_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input resulted in no units to process."));

    dir.close()?;
    Ok(())
}

#[test]
fn test_invalid_yaml_input() -> Result<()> {
    let dir = tempdir()?;
    let input_path = dir.path().join("input.yaml");
    fs::write(&input_path, "this: is: not: valid: yaml")?;

    unitforge()?
        .arg("render")
        .arg("web")
        .arg(&input_path)
        .assert()
        .failure();

    dir.close()?;
    Ok(())
}

#[test]
fn test_section_not_allowed() -> Result<()> {
    let dir = tempdir()?;
    let input_path = dir.path().join("input.yaml");
    fs::write(&input_path, "service:\n  Timer:\n    OnCalendar: daily\n")?;

    unitforge()?
        .arg("render")
        .arg("web")
        .arg(&input_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("section Timer is not allowed in service file"));

    dir.close()?;
    Ok(())
}

#[test]
fn test_render_from_stdin() -> Result<()> {
    let output = unitforge()?
        .args(["render", "web", "--from", "json"])
        .write_stdin(r#"{"service": {"Service": {"ExecStart": ["/bin/a", "/bin/b"], "RemainAfterExit": false}}}"#)
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    insta::assert_snapshot!(stdout, @r"
# web.service
[Service]
ExecStart=/bin/a
ExecStart=/bin/b
RemainAfterExit=false
");
    Ok(())
}

#[test]
fn test_create_then_update() -> Result<()> {
    let dir = tempdir()?;
    let units = dir.path().join("units");
    let input_path = dir.path().join("web.yaml");
    fs::write(&input_path, WEB_YAML)?;

    unitforge()?
        .args(["create", "web"])
        .arg(&input_path)
        .arg("--dir")
        .arg(&units)
        .arg("--no-apply")
        .assert()
        .success();

    let service_content = fs::read_to_string(units.join("web.service"))?;
    insta::assert_snapshot!(service_content, @r"
[Unit]
Description=Web server

[Service]
Type=simple
ExecStart=/usr/bin/web --port 8080
Restart=always

[Install]
WantedBy=multi-user.target
");
    let timer_content = fs::read_to_string(units.join("web.timer"))?;
    assert_eq!(timer_content, "[Timer]\nOnCalendar=*:7/15\nPersistent=true\n");

    // a second create must not clobber the files
    unitforge()?
        .args(["create", "web"])
        .arg(&input_path)
        .arg("--dir")
        .arg(&units)
        .arg("--no-apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains("units for web already exist"));

    let update_path = dir.path().join("update.yml");
    fs::write(
        &update_path,
        "service:\n  Service:\n    ExecStart: /usr/bin/web --port 9090\n    RestartSec: 5\n",
    )?;

    unitforge()?
        .args(["update", "web"])
        .arg(&update_path)
        .arg("--dir")
        .arg(&units)
        .arg("--no-apply")
        .assert()
        .success();

    let service_content = fs::read_to_string(units.join("web.service"))?;
    insta::assert_snapshot!(service_content, @r"
[Unit]
Description=Web server

[Service]
Type=simple
ExecStart=/usr/bin/web --port 9090
Restart=always
RestartSec=5

[Install]
WantedBy=multi-user.target
");
    assert!(units.join("web.timer").exists());

    unitforge()?
        .args(["show", "web", "--dir"])
        .arg(&units)
        .assert()
        .success()
        .stdout(predicate::str::contains("# web.timer"))
        .stdout(predicate::str::contains("RestartSec=5"));

    dir.close()?;
    Ok(())
}

#[test]
fn test_replace_and_delete() -> Result<()> {
    let dir = tempdir()?;
    let units = dir.path().join("units");
    let input_path = dir.path().join("web.yaml");
    fs::write(&input_path, WEB_YAML)?;

    unitforge()?
        .args(["create", "web"])
        .arg(&input_path)
        .arg("--dir")
        .arg(&units)
        .arg("--no-apply")
        .assert()
        .success();

    let replace_path = dir.path().join("replace.json");
    fs::write(
        &replace_path,
        r#"{"service": {"Service": {"ExecStart": "/bin/true"}}}"#,
    )?;
    unitforge()?
        .args(["replace", "web"])
        .arg(&replace_path)
        .arg("--dir")
        .arg(&units)
        .arg("--no-apply")
        .assert()
        .success();

    assert!(!units.join("web.timer").exists());
    assert_eq!(
        fs::read_to_string(units.join("web.service"))?,
        "[Service]\nExecStart=/bin/true\n"
    );

    unitforge()?
        .args(["delete", "web", "--yes", "--dir"])
        .arg(&units)
        .assert()
        .success();
    assert!(!units.join("web.service").exists());

    unitforge()?
        .args(["show", "web", "--dir"])
        .arg(&units)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No units found for web"));

    dir.close()?;
    Ok(())
}

#[test]
fn test_update_requires_existing_units() -> Result<()> {
    let dir = tempdir()?;
    let input_path = dir.path().join("web.yaml");
    fs::write(&input_path, WEB_YAML)?;

    unitforge()?
        .args(["update", "web"])
        .arg(&input_path)
        .arg("--dir")
        .arg(dir.path().join("units"))
        .arg("--no-apply")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no units found for web"));

    dir.close()?;
    Ok(())
}

#[test]
fn test_tera_template_input() -> Result<()> {
    let dir = tempdir()?;
    let input_path = dir.path().join("input.yaml.tera");
    fs::write(
        &input_path,
        "service:\n  Service:\n    ExecStart: \"/usr/bin/{{ name }}\"\n",
    )?;

    unitforge()?
        .args(["render", "backup"])
        .arg(&input_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ExecStart=/usr/bin/backup"));

    dir.close()?;
    Ok(())
}
