//! Clients page, topology, refresh, and remove commands.

use anyhow::Result;
use serde::Deserialize;

use peermap_core::{short_label, Origin, PeerMap, StatusRecord};

use super::http::{base_url, delete_json, get_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ClientsPage {
    clients: Vec<StatusRecord>,
    client_count: u64,
    peer_map: PeerMap,
    cache_ttl_secs: u64,
    cache_age_ms: u64,
}

#[derive(Deserialize)]
struct RemoveResponse {
    removed: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_clients(port: u16, refresh: bool) -> Result<()> {
    let url = if refresh {
        format!("{}/clients?refresh=true", base_url(port))
    } else {
        format!("{}/clients", base_url(port))
    };
    let page: ClientsPage = get_json(&url).await?;

    println!("═══════════════════════════════════════");
    println!("  Clients ({})", page.client_count);
    println!("═══════════════════════════════════════");
    println!("  Peer map nodes : {}", page.peer_map.nodes.len());
    println!("  Peer map edges : {}", page.peer_map.edges.len());
    println!(
        "  Page age       : {:.1}s / {}s",
        page.cache_age_ms as f64 / 1000.0,
        page.cache_ttl_secs
    );

    if page.clients.is_empty() {
        println!("\n  No clients registered.");
        return Ok(());
    }

    println!();
    for c in &page.clients {
        let icon = match (c.status.as_str(), &c.last_error) {
            (_, Some(_)) => "✗",
            ("online", None) => "✓",
            _ => "?",
        };
        println!("  ┌─ {} #{} {}", icon, c.index, c.name);
        println!("  │  version : {}", c.version);
        println!("  │  peer id : {}", short_label(&c.peer_id));
        println!("  │  head    : {} ({})", c.head_slot, c.head_root);
        println!("  │  status  : {}", c.status);
        println!("  │  peers   : {}", c.peers.len());
        if let Some(err) = &c.last_error {
            println!("  │  error   : {}", err);
        }
        println!("  └─ refresh : {} ms", c.last_refresh);
    }

    Ok(())
}

pub async fn cmd_topology(port: u16) -> Result<()> {
    let map: PeerMap = get_json(&format!("{}/clients/topology", base_url(port))).await?;

    let internal = map
        .nodes
        .iter()
        .filter(|n| n.origin == Origin::Internal)
        .count();
    let cross = map.edges.iter().filter(|e| e.cross_boundary).count();

    println!("═══════════════════════════════════════");
    println!("  Peer Map");
    println!("═══════════════════════════════════════");
    println!(
        "  Nodes : {} ({} internal, {} external)",
        map.nodes.len(),
        internal,
        map.nodes.len() - internal
    );
    println!("  Edges : {} ({} cross-boundary)", map.edges.len(), cross);
    if map.stats.self_loops > 0 {
        println!("  Self-loops : {}", map.stats.self_loops);
    }
    if map.stats.malformed_directions + map.stats.duplicate_entries > 0 {
        println!(
            "  Skipped entries : {} duplicate; {} unknown direction",
            map.stats.duplicate_entries, map.stats.malformed_directions
        );
    }

    println!("\n  Nodes:");
    for n in &map.nodes {
        let icon = match n.origin {
            Origin::Internal => "●",
            Origin::External => "○",
        };
        println!("  {} {:<24} degree {}", icon, n.label, n.degree);
    }

    println!("\n  Edges:");
    for e in &map.edges {
        let arrow = if e.cross_boundary { "┄┄▶" } else { "──▶" };
        println!("  {} {} {}", short_label(&e.from), arrow, short_label(&e.to));
    }

    Ok(())
}

pub async fn cmd_remove(port: u16, name: &str) -> Result<()> {
    let resp: RemoveResponse = delete_json(&format!("{}/clients/{}", base_url(port), name)).await?;
    println!("Removed client {}.", resp.removed);
    Ok(())
}
