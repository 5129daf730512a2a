//! # runjs Host Daemon
//!
//! Main entry point for the runjs host runtime.

use runjsd::{HostRuntime, HostRuntimeConfig, Workload};
use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    let report = runtime.run();
    if !report.is_success() {
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<HostRuntimeConfig, String> {
    let mut config = HostRuntimeConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--workers" | "-w" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --workers".to_string());
                }
                config.workers = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid worker count: {}", args[i]))?;
            }
            "--workload" | "-f" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --workload".to_string());
                }
                config.workload = Workload::from_file(&args[i]).map_err(|e| e.to_string())?;
            }
            "--disk-root" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --disk-root".to_string());
                }
                config.disk_root = Some(args[i].clone().into());
            }
            "--log-level" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --log-level".to_string());
                }
                config.log_level = args[i].parse()?;
            }
            "--quiet" => {
                config.echo_output = false;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  -w, --workers <N>        Worker threads (default: CPU count, max {})",
        runjsd::MAX_WORKERS
    );
    eprintln!("  -f, --workload <FILE>    JSON workload manifest");
    eprintln!("  --disk-root <DIR>        Serve file ops from DIR instead of memory");
    eprintln!("  --log-level <LEVEL>      debug, info, warn (default) or error");
    eprintln!("  --quiet                  Do not echo worker output");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --workers 2", program);
    eprintln!("  {} --workload demos/alpha_beta.json", program);
}
