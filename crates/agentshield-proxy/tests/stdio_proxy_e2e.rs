//! Spawns the real `agentshield` binary wrapping `cat` (an in-place echo
//! fixture) over stdio and feeds it JSON-RPC lines, mirroring the teacher's
//! own `no_passthrough_e2e.rs`: a real child process, piped stdin/stdout,
//! line-at-a-time assertions on what comes back.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

fn spawn_proxy() -> (std::process::Child, std::process::ChildStdin, BufReader<std::process::ChildStdout>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_agentshield"))
        .args(["mcp", "stdio", "--", "cat"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn agentshield binary");
    let stdin = child.stdin.take().expect("stdin");
    let stdout = BufReader::new(child.stdout.take().expect("stdout"));
    (child, stdin, stdout)
}

#[test]
fn blocked_tool_call_never_reaches_downstream_echo() {
    let (mut child, mut stdin, mut stdout) = spawn_proxy();

    let request = serde_json::json!({
        "jsonrpc": "2.0", "id": 1, "method": "tools/call",
        "params": {"name": "execute_command", "arguments": {"command": "whoami"}}
    });
    writeln!(stdin, "{request}").unwrap();
    stdin.flush().unwrap();

    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    let response: serde_json::Value = serde_json::from_str(line.trim()).expect("valid JSON response");

    assert_eq!(response["id"], 1);
    assert_eq!(response["error"]["code"], -32000);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn allowed_tool_call_round_trips_through_downstream_echo() {
    let (mut child, mut stdin, mut stdout) = spawn_proxy();

    let request = serde_json::json!({
        "jsonrpc": "2.0", "id": 7, "method": "tools/call",
        "params": {"name": "read_file", "arguments": {"path": "/tmp/notes.txt"}}
    });
    writeln!(stdin, "{request}").unwrap();
    stdin.flush().unwrap();

    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    let echoed: serde_json::Value = serde_json::from_str(line.trim()).expect("valid JSON echoed back");

    assert_eq!(echoed, request);

    drop(stdin);
    let _ = child.wait();
}
