use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{PacketInventoryManifest, ParseRunSummary};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = manifest_dir.join("packet_inventory.json");
    let db_path = args.cache_root.join("bidpacket_index.sqlite");

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: PacketInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            packet_count = inventory.packet_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_parse_manifest(&manifest_dir)? {
        Some(path) => {
            let raw = fs::read(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let summary: ParseRunSummary = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                path = %path.display(),
                run_id = %summary.run_id.unwrap_or_default(),
                status = %summary.status.unwrap_or_default(),
                started_at = %summary.started_at.unwrap_or_default(),
                updated_at = %summary.updated_at.unwrap_or_default(),
                warnings = summary.warnings.map(|warnings| warnings.len()).unwrap_or(0),
                "loaded latest parse run manifest"
            );
        }
        None => {
            warn!(path = %manifest_dir.display(), "no parse run manifest found");
        }
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let packets_count = query_count(&conn, "SELECT COUNT(*) FROM packets").unwrap_or(0);
        let sequences_count = query_count(&conn, "SELECT COUNT(*) FROM sequences").unwrap_or(0);

        info!(
            path = %db_path.display(),
            packets = packets_count,
            sequences = sequences_count,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

fn latest_parse_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();

        let is_parse_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("parse_run_") && name.ends_with(".json"))
            .unwrap_or(false);

        if is_parse_manifest && latest.as_ref().is_none_or(|current| &path > current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
