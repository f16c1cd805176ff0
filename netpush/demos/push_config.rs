//! Push a VLAN to a device, or read from it, as a tracked task.
//!
//! # Usage
//!
//! Create a VLAN on a Huawei switch:
//! ```bash
//! cargo run --example push_config -- --host 10.0.0.1 --user admin --password secret \
//!     --dialect huawei --vlan 100 --name users
//! ```
//!
//! Read the version from a Cisco router:
//! ```bash
//! cargo run --example push_config -- --host 10.0.0.2 --user admin --password secret \
//!     --secret enable-secret --dialect cisco_ios --show version
//! ```

use std::env;
use std::time::Duration;

use netpush::platform::vocabulary::Show;
use netpush::{DeviceDescriptor, DialectKind, SessionConfig, TaskRequest, TaskRunner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let dialect: DialectKind = args.dialect.parse()?;
    let mut device = DeviceDescriptor::new(&args.host, &args.host, &args.user, &args.password, dialect)
        .with_port(args.port);
    if let Some(secret) = &args.secret {
        device = device.with_secret(secret);
    }

    let request = match (&args.show, args.vlan) {
        (Some(what), _) => TaskRequest::Show {
            what: serde_json::from_value::<Show>(serde_json::Value::String(what.clone()))?,
        },
        (None, Some(vlan)) => TaskRequest::CreateVlan {
            vlan,
            name: args.name.clone(),
        },
        (None, None) => {
            eprintln!("Error: Must provide either --vlan or --show");
            std::process::exit(1);
        }
    };

    let config = SessionConfig::default()
        .with_connect_timeout(Duration::from_secs(args.timeout))
        .with_deadline(Duration::from_secs(args.deadline));
    let runner = TaskRunner::ssh(config);

    let task = runner.submit(device, request)?;
    println!("Task {} ({}) submitted", task.id, task.label);

    let task = runner.wait(task.id).await?;
    println!("Task {} {}", task.id, task.status);
    println!("{}", "-".repeat(50));

    if let Some(payload) = &task.payload {
        for result in &payload.results {
            let mark = if result.success { "ok" } else { "FAILED" };
            println!("[{:>6}] {} ({:?})", mark, result.command, result.elapsed);
            if !result.output.is_empty() {
                println!("{}", result.output);
            }
        }
    }
    if let Some(error) = task.error_message() {
        eprintln!("Error: {}", error);
    }

    println!("{}", "-".repeat(50));
    let view = runner.tracker().status(task.id)?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: String,
    secret: Option<String>,
    dialect: String,
    vlan: Option<u16>,
    name: Option<String>,
    show: Option<String>,
    timeout: u64,
    deadline: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: String::new(),
            secret: None,
            dialect: "cisco_ios".to_string(),
            vlan: None,
            name: None,
            show: None,
            timeout: 30,
            deadline: 300,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match (args[i].as_str(), value) {
                ("--host" | "-h", Some(v)) => parsed.host = v,
                ("--port" | "-p", Some(v)) => parsed.port = v.parse().unwrap_or(22),
                ("--user" | "-u", Some(v)) => parsed.user = v,
                ("--password" | "-P", Some(v)) => parsed.password = v,
                ("--secret" | "-s", Some(v)) => parsed.secret = Some(v),
                ("--dialect" | "-d", Some(v)) => parsed.dialect = v,
                ("--vlan", Some(v)) => parsed.vlan = v.parse().ok(),
                ("--name", Some(v)) => parsed.name = Some(v),
                ("--show", Some(v)) => parsed.show = Some(v),
                ("--timeout" | "-t", Some(v)) => parsed.timeout = v.parse().unwrap_or(30),
                ("--deadline", Some(v)) => parsed.deadline = v.parse().unwrap_or(300),
                ("--help", _) => {
                    Self::print_help();
                    std::process::exit(0);
                }
                (other, _) => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        parsed
    }

    fn print_help() {
        println!(
            r#"netpush push_config example

USAGE:
    cargo run --example push_config -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>        Target host [default: localhost]
    -p, --port <PORT>        SSH port [default: 22]
    -u, --user <USER>        Username [default: $USER]
    -P, --password <PASS>    Password for authentication
    -s, --secret <SECRET>    Enable secret
    -d, --dialect <TAG>      cisco_ios, cisco_xe, cisco_nxos, huawei, huawei_vrpv8
    --vlan <ID>              Create this VLAN
    --name <NAME>            VLAN name
    --show <WHAT>            version, interfaces, vlans, routes, vrfs, running_config
    -t, --timeout <SECS>     Connection timeout [default: 30]
    --deadline <SECS>        Overall session deadline [default: 300]
    --help                   Print this help message"#
        );
    }
}
