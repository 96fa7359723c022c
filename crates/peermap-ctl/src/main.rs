//! peermap-ctl — command-line interface for the peermap daemon.

mod cmd;

use anyhow::{Context, Result};

const DEFAULT_PORT: u16 = 9101;

fn print_usage() {
    println!("Usage: peermap-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  clients          Show every client's status (default)");
    println!("  topology         Show the peer map nodes and edges");
    println!("  refresh          Rebuild the clients page and show it");
    println!("  remove <name>    Remove a client from the registry");
    println!();
    println!("Options:");
    println!("  --port <port>   API port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Parse --port option
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["clients"] | [] => cmd::clients::cmd_clients(port, false).await,
        ["refresh"] => cmd::clients::cmd_clients(port, true).await,
        ["topology"] => cmd::clients::cmd_topology(port).await,
        ["remove", name] => cmd::clients::cmd_remove(port, name).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
