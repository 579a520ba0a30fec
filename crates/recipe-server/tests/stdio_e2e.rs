use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

#[test]
fn test_stdio_flow() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("server.db");

    let mut child = Command::new(env!("CARGO_BIN_EXE_recipe-server"))
        .arg("--db")
        .arg(&db)
        .env("RECIPE_LOG", "warn")
        .env_remove("RECIPE_CONFIG")
        .env_remove("RECIPE_DB")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin");
    let mut reader = BufReader::new(child.stdout.take().expect("stdout"));

    let mut send = |req: Value| -> anyhow::Result<Value> {
        writeln!(stdin, "{}", req)?;
        stdin.flush()?;
        let mut line = String::new();
        reader.read_line(&mut line)?;
        Ok(serde_json::from_str(&line)?)
    };

    // 1. Initialize
    let resp = send(json!({"jsonrpc": "2.0", "method": "initialize", "id": 1}))?;
    assert_eq!(resp["result"]["serverInfo"]["name"], "recipe-server");
    let methods = resp["result"]["methods"].as_array().expect("methods list");
    assert_eq!(methods.len(), 8);

    // 2. Write two versions
    for (id, version, name) in [(2, "1.0", "old"), (3, "1.1", "new")] {
        let resp = send(json!({
            "jsonrpc": "2.0",
            "method": "upsert_recipe",
            "params": {
                "recipe_id": "abc", "version": version, "test_number": 3,
                "test_name": name, "characteristic": "pressure drop",
                "target_value": 1.5, "tol_lower": 1.2, "tol_upper": 1.8,
                "unit": "bar", "method_reference": "ISO-5167"
            },
            "id": id
        }))?;
        assert!(resp.get("error").is_none(), "upsert failed: {resp:?}");
    }

    // 3. Filename resolution
    let resp = send(json!({
        "jsonrpc": "2.0",
        "method": "get_latest_version_from_filename",
        "params": {"filename": "abc_v1.csv"},
        "id": 4
    }))?;
    assert_eq!(resp["result"]["version"], "1.1");

    let resp = send(json!({
        "jsonrpc": "2.0",
        "method": "get_test_info_from_filename",
        "params": {"filename": "abc_v1.csv", "test_number": 3},
        "id": 5
    }))?;
    assert_eq!(resp["result"]["status"], "found");
    assert_eq!(resp["result"]["test_name"], "new");

    // 4. Delete and observe
    let resp = send(json!({
        "jsonrpc": "2.0",
        "method": "delete_recipe_version",
        "params": {"recipe_id": "abc", "version": "1.1"},
        "id": 6
    }))?;
    assert_eq!(resp["result"]["removed"], 1);

    let resp = send(json!({
        "jsonrpc": "2.0",
        "method": "get_recipe_version",
        "params": {"recipe_id": "abc", "version": "1.1"},
        "id": 7
    }))?;
    assert_eq!(resp["result"], json!([]));

    let resp = send(json!({
        "jsonrpc": "2.0",
        "method": "get_latest_version_from_filename",
        "params": {"filename": "abc.csv"},
        "id": 8
    }))?;
    assert_eq!(resp["result"]["version"], "1.0");

    drop(send);
    drop(stdin);
    let status = child.wait()?;
    assert!(status.success());
    Ok(())
}
