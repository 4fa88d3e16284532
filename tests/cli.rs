//! Runs the built binary end to end.
use std::io::Read;
use std::net::{Ipv4Addr, TcpListener};
use std::process::{Command, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

const TIMEOUT: Duration = Duration::from_secs(30);

struct Run {
    success: bool,
    stdout: String,
    stderr: String,
}

fn run(args: &[&str]) -> Run {
    let mut child = Command::new(env!("CARGO_BIN_EXE_portsweep"))
        .arg("--no-config")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let status = match child.wait_timeout(TIMEOUT).unwrap() {
        Some(status) => status,
        None => {
            child.kill().unwrap();
            panic!("portsweep did not finish within {TIMEOUT:?}");
        }
    };

    let mut stdout = String::new();
    let mut stderr = String::new();
    child.stdout.take().unwrap().read_to_string(&mut stdout).unwrap();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();

    Run {
        success: status.success(),
        stdout,
        stderr,
    }
}

#[test]
fn prints_json_summary() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let run = run(&["-a", "127.0.0.1", "-s", &port, "-e", &port, "-w", "4"]);
    assert!(run.success, "{}", run.stderr);

    let summary: serde_json::Value = serde_json::from_str(&run.stdout).unwrap();
    assert_eq!(summary["host"], "127.0.0.1");
    assert_eq!(summary["start_port"].to_string(), port);
    assert_eq!(summary["end_port"].to_string(), port);
    assert_eq!(summary["open_ports"][0].to_string(), port);
    assert_eq!(summary["open_ports"].as_array().unwrap().len(), 1);
    assert!(summary["scan_time_ms"].is_u64());
    assert!(run.stderr.contains("Scan complete"));
}

#[test]
fn greppable_output_is_one_line() {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    let range = format!("{port}-{port}");

    let run = run(&["-a", "127.0.0.1", "-r", &range, "-g"]);
    assert!(run.success);
    assert_eq!(run.stdout.trim(), format!("127.0.0.1 -> [{port}]"));
    assert!(run.stderr.is_empty(), "{}", run.stderr);
}

#[test]
fn reversed_range_fails_before_scanning() {
    let run = run(&["-a", "127.0.0.1", "-s", "1", "-e", "0"]);

    assert!(!run.success);
    assert!(run.stdout.is_empty());
    assert!(run.stderr.contains("start port 1 is greater than end port 0"));
}

#[test]
fn zero_workers_are_rejected() {
    let run = run(&["-a", "127.0.0.1", "-w", "0"]);

    assert!(!run.success);
    assert!(run.stderr.contains("worker count must be at least 1"));
}
