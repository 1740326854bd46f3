mod common;

use assert_cmd::Command;
use common::data_root;
use predicates::str::contains;

fn orfi(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("orfi_cli").unwrap();
    cmd.env("ORFI_CLI_SCRIPT", "1")
        .env("ORFI_HOME", root)
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let root = data_root();
    let input = "\
month 04
add-income Salario 3.500.000 Trabajo 1
add-fixed Arriendo 1.200.000 Vivienda 5
summary
exit
";

    orfi(&root)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Now on 04 Abril"))
        .stdout(contains("Added #"))
        .stdout(contains("$ 2.300.000"));

    let ledger = std::fs::read_to_string(root.join("ledger.json")).unwrap();
    assert!(ledger.contains("Arriendo"));
}

#[test]
fn errors_do_not_stop_the_script() {
    let root = data_root();
    orfi(&root)
        .write_stdin("month 02\nclose\nadd-purchase Mercado 100000\nsumary\nreopen\nadd-purchase Mercado 100000\n")
        .assert()
        .success()
        .stderr(contains("line 3: Month 02 is closed."))
        .stderr(contains("Unknown command `sumary`"))
        .stdout(contains("Suggestion: `summary`?"))
        .stdout(contains("Added #"));
}

#[test]
fn export_prints_the_document() {
    let root = data_root();
    orfi(&root)
        .write_stdin("month 09\nadd-goal Viaje 4000000 0\nexport\n")
        .assert()
        .success()
        .stdout(contains("\"current_month\": \"09\""))
        .stdout(contains("Viaje"));
}
