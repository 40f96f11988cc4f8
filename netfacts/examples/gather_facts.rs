//! Gather facts from an OcNOS device and print them as JSON.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example gather_facts -- --host 192.0.2.10 --user ocnos --password ocnos
//! ```
//!
//! Only some categories:
//! ```bash
//! cargo run --example gather_facts -- --host leaf-1 --user ocnos --key ~/.ssh/id_ed25519 \
//!     --subset interfaces,bgp-neighbor
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use netfacts::{Collector, FactCategory, HostKeyVerification, SessionBuilder, SharedSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let subset: Vec<&str> = args.subset.split(',').collect();
    let categories = FactCategory::select(&subset)?;

    let mut builder = SessionBuilder::new(&args.host)
        .port(args.port)
        .username(&args.user)
        .timeout(Duration::from_secs(args.timeout));

    if let Some(password) = &args.password {
        builder = builder.password(password);
    } else if let Some(key_path) = &args.key {
        builder = builder.private_key(key_path);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }
    if args.insecure {
        builder = builder.host_key_verification(HostKeyVerification::Disabled);
    }

    let mut session = builder.build()?;
    session.open().await?;
    let session = SharedSession::new(session);

    let collection = Collector::default()
        .collect_all(&session, &categories)
        .await;
    session.close().await?;

    for warning in &collection.warnings {
        eprintln!("warning: {}", warning);
    }
    println!("{}", serde_json::to_string_pretty(&collection.facts)?);

    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
    subset: String,
    insecure: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "ocnos".to_string());
        let mut password = None;
        let mut key = None;
        let mut timeout = 30u64;
        let mut subset = "all".to_string();
        let mut insecure = false;

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => {
                    host = value.unwrap_or(host);
                    i += 1;
                }
                "--port" | "-p" => {
                    port = value.and_then(|v| v.parse().ok()).unwrap_or(22);
                    i += 1;
                }
                "--user" | "-u" => {
                    user = value.unwrap_or(user);
                    i += 1;
                }
                "--password" | "-P" => {
                    password = value;
                    i += 1;
                }
                "--key" | "-k" => {
                    key = value.map(PathBuf::from);
                    i += 1;
                }
                "--timeout" | "-t" => {
                    timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30);
                    i += 1;
                }
                "--subset" | "-s" => {
                    subset = value.unwrap_or(subset);
                    i += 1;
                }
                "--insecure" => insecure = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => eprintln!("Unknown argument: {}", other),
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            key,
            timeout,
            subset,
            insecure,
        }
    }

    fn print_help() {
        println!(
            r#"netfacts gather_facts example

USAGE:
    cargo run --example gather_facts -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target host [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password for authentication
    -k, --key <PATH>         Path to SSH private key
    -t, --timeout <SECS>     Connection and command timeout [default: 30]
    -s, --subset <LIST>      Comma-separated categories, `!name` excludes [default: all]
                             (default, hardware, config, interfaces, bgp-neighbor, isis-neighbor)
    --insecure               Do not check the host key
    --help                   Print this help message
"#
        );
    }
}
