use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{PacketEntry, PacketInventoryManifest};
use crate::packet::{MonthYearInferencer, UNKNOWN_METADATA, UNKNOWN_MONTH};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.cache_root)?;

    if args.dry_run {
        info!(
            packet_count = manifest.packet_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.cache_root.join("manifests").join("packet_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(packet_count = manifest.packet_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(cache_root: &Path) -> Result<PacketInventoryManifest> {
    let base_fleet = Regex::new(r"([A-Za-z]{3})_(\d{3})")
        .context("failed to compile packet filename regex")?;
    let months = MonthYearInferencer::new()?;

    let mut packet_paths = discover_packets(cache_root)?;
    packet_paths.sort();

    if packet_paths.is_empty() {
        bail!("no bid packet PDFs found in {}", cache_root.display());
    }

    let mut packets = Vec::with_capacity(packet_paths.len());
    for path in packet_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let (base, fleet) = match base_fleet.captures(&filename) {
            Some(captures) => (captures[1].to_ascii_uppercase(), captures[2].to_string()),
            None => (UNKNOWN_METADATA.to_string(), UNKNOWN_METADATA.to_string()),
        };

        let (month, year) = match months.month_from_file_name(&filename) {
            Some(found) => (found.month, Some(found.year)),
            None => (UNKNOWN_MONTH.to_string(), None),
        };

        let sha256 = sha256_file(&path)?;

        packets.push(PacketEntry {
            filename,
            base,
            fleet,
            month,
            year,
            sha256,
        });
    }

    packets.sort_by(|a, b| a.year.cmp(&b.year).then(a.filename.cmp(&b.filename)));

    Ok(PacketInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: cache_root.display().to_string(),
        packet_count: packets.len(),
        packets,
    })
}

fn discover_packets(cache_root: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut packets = Vec::new();

    let entries = fs::read_dir(cache_root)
        .with_context(|| format!("failed to read {}", cache_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", cache_root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            packets.push(path);
        }
    }

    Ok(packets)
}
