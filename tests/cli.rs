use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

fn agenda(dir: &TempDir) -> Result<Command> {
    let mut cmd = Command::cargo_bin("agenda")?;
    cmd.env("AGENDA_DATA_DIR", dir.path())
        .env_remove("RUST_LOG");
    Ok(cmd)
}

fn demo_dir() -> Result<TempDir> {
    let dir = tempdir()?;
    agenda(&dir)?
        .args(["init", "--demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));
    Ok(dir)
}

#[test]
fn scan_lists_demo_anomalies() -> Result<()> {
    let dir = demo_dir()?;

    agenda(&dir)?
        .args(["fix", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 appointment(s) with missing prices"))
        .stdout(predicate::str::contains("unidentified client"))
        .stdout(predicate::str::contains("unidentified service"));
    Ok(())
}

#[test]
fn scan_as_json_reports_decimal_prices() -> Result<()> {
    let dir = demo_dir()?;

    let output = agenda(&dir)?.args(["fix", "scan", "--format", "json"]).output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let rows = report.as_array().expect("array report");
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().any(|r| r["suggested_total"] == "40.00"));
    Ok(())
}

#[test]
fn negative_price_in_batch_changes_nothing() -> Result<()> {
    let dir = demo_dir()?;

    agenda(&dir)?
        .args(["service", "set-prices", "Haircut=45", "Wash=-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no prices were changed"));

    agenda(&dir)?
        .args(["service", "show", "Haircut"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$40.00"));
    Ok(())
}

#[test]
fn failed_batch_write_says_what_was_not_saved() -> Result<()> {
    let dir = demo_dir()?;
    // The atomic writer cannot create its temp file over a directory
    std::fs::create_dir(dir.path().join("data").join("services.json.tmp"))?;

    agenda(&dir)?
        .args(["service", "set-prices", "Haircut=45", "Wash=15"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("0 updated, 0 unchanged, 2 failed"))
        .stderr(predicate::str::contains("Could not save Haircut, Wash"))
        .stderr(predicate::str::contains("no other price was changed"))
        .stdout(predicate::str::contains("Nothing else was changed").not())
        .stderr(predicate::str::contains("Nothing else was changed").not());
    Ok(())
}

#[test]
fn service_list_flags_zero_price() -> Result<()> {
    let dir = demo_dir()?;

    agenda(&dir)?
        .args(["service", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beard Trim"))
        .stdout(predicate::str::contains("booked line item(s) have no price"));
    Ok(())
}

#[test]
fn quote_warns_about_unpriced_service() -> Result<()> {
    let dir = demo_dir()?;

    agenda(&dir)?
        .args(["quote", "--service", "Haircut", "--service", "Wash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$40.00"))
        .stdout(predicate::str::contains("no price set"));

    agenda(&dir)?
        .args(["quote", "-s", "Haircut", "-s", "Wash", "-p", "Wash=12.50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$52.50"))
        .stdout(predicate::str::contains("Warning").not());
    Ok(())
}

#[test]
fn apply_all_repairs_what_has_a_price() -> Result<()> {
    let dir = demo_dir()?;

    agenda(&dir)?
        .args(["service", "set-prices", "Wash=15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 updated, 0 unchanged, 0 failed"));

    agenda(&dir)?
        .args(["fix", "apply-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 fixed, 0 skipped, 0 failed"));

    // The line item whose service was deleted is saved at 0.00 and stays flagged
    agenda(&dir)?
        .args(["fix", "scan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 appointment(s) with missing prices"));

    agenda(&dir)?
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UPDATE"))
        .stdout(predicate::str::contains("RECONCILE"))
        .stdout(predicate::str::contains("default_price: 0.00 -> 15.00"));
    Ok(())
}

#[test]
fn history_is_empty_on_fresh_store() -> Result<()> {
    let dir = tempdir()?;
    agenda(&dir)?.arg("init").assert().success();

    agenda(&dir)?
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No price changes recorded."));

    agenda(&dir)?
        .args(["fix", "apply-all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Everything is in order"));
    Ok(())
}
