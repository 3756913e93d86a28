use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = r#"[
  {"id": "m2", "caja": "200_BANCO", "fecha": "02/01/2025", "concepto": "Transferencia recibida", "importe": 50, "saldo": 150},
  {"id": "m1", "caja": "200_BANCO", "fecha": "01/01/2025", "concepto": "Recibo luz", "importe": -20, "saldo": 100}
]"#;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("cajero.db")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cajero").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("CAJERO_DB", self.db())
            .env("RUST_LOG", "off");
        cmd
    }

    fn imported() -> Self {
        let env = Self::new();
        let file = env.write("statement.json", STATEMENT);
        env.cmd().arg("import").arg(&file).assert().success();
        env
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn status_without_database() {
    let env = Env::new();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
}

#[test]
fn import_then_list_accounts_and_records() {
    let env = Env::new();
    let file = env.write("statement.json", STATEMENT);
    env.cmd()
        .args(["import", arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"))
        .stdout(predicate::str::contains("Balances are consistent"));

    env.cmd()
        .arg("accounts")
        .assert()
        .success()
        .stdout(predicate::str::contains("200_BANCO"));

    env.cmd()
        .args(["records", "200_BANCO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recibo luz"))
        .stdout(predicate::str::contains("-20,00 €"))
        .stdout(predicate::str::contains("Page 1/1 | Rows 2 of 2 (2)"));
}

#[test]
fn reimport_has_nothing_new() {
    let env = Env::imported();
    let file = env.write("again.json", STATEMENT);
    env.cmd()
        .args(["import", arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to import"));
}

#[test]
fn import_refuses_ascending_statement() {
    let env = Env::new();
    let file = env.write(
        "ascending.json",
        r#"[
          {"id": "a", "caja": "200_BANCO", "fecha": "01/01/2025", "importe": 0, "saldo": 100},
          {"id": "b", "caja": "200_BANCO", "fecha": "02/01/2025", "importe": 5, "saldo": 105}
        ]"#,
    );
    env.cmd()
        .args(["import", arg(&file)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("descending date order"));
}

#[test]
fn inconsistent_balance_needs_force() {
    let env = Env::new();
    let file = env.write(
        "broken.json",
        r#"[
          {"id": "b", "caja": "200_BANCO", "fecha": "02/01/2025", "importe": 5, "saldo": 999},
          {"id": "a", "caja": "200_BANCO", "fecha": "01/01/2025", "importe": 0, "saldo": 100}
        ]"#,
    );
    env.cmd()
        .args(["import", arg(&file)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    env.cmd()
        .args(["import", arg(&file), "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 imported"));
}

#[test]
fn records_filters_and_csv() {
    let env = Env::imported();
    env.cmd()
        .args(["records", "200_BANCO", "--search", "LUZ", "--field", "concepto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows 1 of 1 (2)"));

    env.cmd()
        .args(["records", "200_BANCO", "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("id,caja,fecha,concepto,importe"))
        .stdout(predicate::str::contains("m1,200_BANCO"));

    env.cmd()
        .args(["records", "NOPE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown account"));
}

#[test]
fn toggle_with_and_without_confirmation() {
    let env = Env::imported();
    env.cmd()
        .args(["toggle", "200_BANCO", "m1"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));

    env.cmd()
        .args(["toggle", "200_BANCO", "m1", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("m1 is now accounted"));

    env.cmd()
        .args(["records", "200_BANCO", "--tab", "contabilized"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Contabilizados (1)"))
        .stdout(predicate::str::contains("Rows 1 of 1 (2)"));
}

#[test]
fn tasks_add_list_delete() {
    let env = Env::imported();
    let file = env.write(
        "task.json",
        r#"{"tipo": "ado220", "detalle": {"expediente": "EXP-1", "caja": "200",
            "aplicaciones": [{"funcional": "920", "economica": "22100", "importe": 20}]}}"#,
    );
    env.cmd()
        .args(["tasks", "add", "m1", arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved 1 task(s)"));

    env.cmd()
        .args(["tasks", "list", "m1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ADO]"))
        .stdout(predicate::str::contains("200 (200_BANCO)"))
        .stdout(predicate::str::contains("TOTAL: 20,00 €"));

    env.cmd()
        .args(["records", "200_BANCO", "--tab", "not_contabilized"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No contabilizados (1)"));

    env.cmd()
        .args(["tasks", "delete", "m1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 task(s)"));

    env.cmd()
        .args(["tasks", "list", "m1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks for m1"));
}

#[test]
fn preview_marks_duplicates() {
    let env = Env::imported();
    let file = env.write(
        "next.json",
        r#"[
          {"id": "m3", "caja": "200_BANCO", "fecha": "03/01/2025", "concepto": "Nueva", "importe": -50, "saldo": 100},
          {"id": "m2", "caja": "200_BANCO", "fecha": "02/01/2025", "concepto": "Transferencia recibida", "importe": 50, "saldo": 150}
        ]"#,
    );
    env.cmd()
        .args(["preview", arg(&file)])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records, 1 new, 1 already in the database"));
}

#[test]
fn import_skips_selected_records() {
    let env = Env::new();
    let file = env.write("statement.json", STATEMENT);
    env.cmd()
        .args(["import", arg(&file), "--skip", "m2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 left out"))
        .stdout(predicate::str::contains("1 imported"));

    env.cmd()
        .args(["records", "200_BANCO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recibo luz"))
        .stdout(predicate::str::contains("Transferencia recibida").not());
}

