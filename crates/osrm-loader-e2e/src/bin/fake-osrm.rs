//! Stand-in for `osrm-routed` and `osrm-datastore`.
//!
//! `osrm-routed` mode binds `-i`/`-p`, prints a ready line and drops every
//! accepted connection after logging it. Test-only flags:
//!
//! - `--no-listen` - never bind, so readiness probing times out
//! - `--exit-after-ms <n>` - exit with code 1 after `n` ms (simulated crash)
//!
//! `osrm-datastore` mode fails with exit code 3 for inputs containing
//! `invalid`, and succeeds otherwise.

use std::fs::OpenOptions;
use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use osrm_loader_e2e::RECORD_ENV;

fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_default();
    let args: Vec<String> = args.collect();

    let tool = Path::new(&program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    record(&tool, &args);

    match tool.as_str() {
        "osrm-datastore" => datastore(&args),
        "osrm-routed" => routed(&args),
        other => {
            eprintln!("fake-osrm: unknown tool name {other:?}");
            ExitCode::from(2)
        }
    }
}

fn record(tool: &str, args: &[String]) {
    let Ok(path) = std::env::var(RECORD_ENV) else {
        return;
    };
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{tool} {}", args.join(" "));
    }
}

fn datastore(args: &[String]) -> ExitCode {
    let input = args.iter().find(|a| !a.starts_with('-'));
    match input {
        Some(input) if !input.contains("invalid") => {
            println!("[info] Dataset {input} published");
            ExitCode::SUCCESS
        }
        Some(input) => {
            eprintln!("[error] Input file {input} is not a valid dataset");
            ExitCode::from(3)
        }
        None => {
            eprintln!("[error] No input file given");
            ExitCode::from(1)
        }
    }
}

fn routed(args: &[String]) -> ExitCode {
    let mut host = "0.0.0.0".to_string();
    let mut port: u16 = 5000;
    let mut listen = true;
    let mut exit_after: Option<u64> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-i" => host = iter.next().cloned().unwrap_or(host),
            "-p" => port = iter.next().and_then(|p| p.parse().ok()).unwrap_or(port),
            "--no-listen" => listen = false,
            "--exit-after-ms" => exit_after = iter.next().and_then(|v| v.parse().ok()),
            _ => {}
        }
    }

    if let Some(ms) = exit_after {
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(ms));
            eprintln!("[error] simulated crash");
            std::process::exit(1);
        });
    }

    if !listen {
        println!("[info] not listening");
        loop {
            std::thread::sleep(Duration::from_secs(1));
        }
    }

    let listener = match TcpListener::bind((host.as_str(), port)) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("[error] could not bind {host}:{port}: {e}");
            return ExitCode::from(1);
        }
    };
    println!("[info] running and waiting for requests");

    for stream in listener.incoming() {
        if stream.is_ok() {
            println!("[info] connection accepted");
        }
    }
    ExitCode::SUCCESS
}
