use assert_cmd::{Command, cargo};
use std::fs;
use tempfile::tempdir;

fn lms_move() -> Command {
    Command::new(cargo::cargo_bin!("lms_move"))
}

#[test]
fn help_mentions_junction_flags() {
    let out = lms_move().arg("--help").output().expect("spawn binary");
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("--link-only"));
    assert!(text.contains("--overwrite"));
}

#[test]
fn print_config_succeeds() {
    let td = tempdir().unwrap();
    lms_move()
        .env("LMS_MOVE_CONFIG", td.path().join("config.xml"))
        .arg("--print-config")
        .assert()
        .success();
}

#[test]
fn init_config_writes_template_once() {
    let td = tempdir().unwrap();
    let cfg = td.path().join("nested").join("config.xml");
    lms_move()
        .arg("--init-config")
        .arg("--config")
        .arg(&cfg)
        .assert()
        .success();
    let text = fs::read_to_string(&cfg).unwrap();
    assert!(text.contains("<source>"));

    lms_move()
        .arg("--init-config")
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure();
}

#[test]
fn info_reports_both_directories() {
    let td = tempdir().unwrap();
    let src = td.path().join("cache");
    fs::create_dir_all(src.join("models")).unwrap();
    fs::write(src.join("models").join("m.gguf"), vec![0u8; 2048]).unwrap();

    let out = lms_move()
        .env_remove("LMS_MOVE_CONFIG")
        .arg("--info")
        .arg("-s")
        .arg(&src)
        .arg("-t")
        .arg(td.path().join("new"))
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("Files:  1"));
    assert!(text.contains("does not exist"));
}

#[test]
fn gui_flag_explains_itself() {
    let out = lms_move().arg("--gui").output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no graphical front-end"), "stderr: {stderr}");
    assert!(!stderr.contains("unexpected argument"));
}

#[test]
fn missing_explicit_config_fails() {
    let td = tempdir().unwrap();
    let out = lms_move()
        .arg("--config")
        .arg(td.path().join("none.xml"))
        .arg("--info")
        .output()
        .unwrap();
    assert!(!out.status.success(), "missing --config file must fail");
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist"));
}

#[cfg(not(windows))]
#[test]
fn refuses_to_migrate_off_windows() {
    let td = tempdir().unwrap();
    let src = td.path().join("cache");
    fs::create_dir_all(&src).unwrap();
    lms_move()
        .env_remove("LMS_MOVE_CONFIG")
        .arg("-s")
        .arg(&src)
        .arg("-t")
        .arg(td.path().join("new"))
        .arg("--yes")
        .assert()
        .code(2);
    assert!(src.is_dir());
}
