use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::cli::ParseArgs;
use crate::commands::inventory;
use crate::extract::extractor;
use crate::model::{
    PacketEntry, PacketInventoryManifest, ParseCounts, ParsePaths, ParseRunManifest, ToolVersions,
    UploadedBidPacket,
};
use crate::packet::PacketParser;
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

const DB_SCHEMA_VERSION: &str = "0.1.0";

pub fn run(args: ParseArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("packet_inventory.json"));
    let parse_manifest_path = args.parse_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("parse_run_{}.json", utc_compact_string(started_ts)))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("bidpacket_index.sqlite"));
    let parsed_dir = args
        .parsed_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("parsed"));
    ensure_directory(&parsed_dir)?;

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting parse run");

    let inventory = load_or_refresh_inventory(
        &cache_root,
        &inventory_manifest_path,
        args.refresh_inventory,
    )?;

    let tool_versions = collect_tool_versions()?;

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let parser = PacketParser::new()?;
    let stats = parse_packets(
        &mut connection,
        &cache_root,
        &parsed_dir,
        &inventory.packets,
        &parser,
        args.packet_file.as_deref(),
        args.max_pages_per_doc,
    )?;

    let packets_total = count_rows(&connection, "SELECT COUNT(*) FROM packets")?;
    let sequences_total = count_rows(&connection, "SELECT COUNT(*) FROM sequences")?;
    let updated_at = now_utc_string();

    let manifest = ParseRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at,
        command: render_parse_command(&args),
        tool_versions,
        paths: ParsePaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
            parsed_dir: parsed_dir.display().to_string(),
        },
        counts: ParseCounts {
            packet_count: inventory.packet_count,
            processed_packet_count: stats.processed_packet_count,
            packets_total,
            sequences_total,
            sequences_parsed: stats.sequences_parsed,
            duty_days_parsed: stats.duty_days_parsed,
            legs_parsed: stats.legs_parsed,
            sequences_without_credit: stats.sequences_without_credit,
            duty_days_without_report: stats.duty_days_without_report,
            duty_days_without_calendar_date: stats.duty_days_without_calendar_date,
        },
        source_hashes: inventory.packets,
        warnings: stats.warnings,
        notes: vec![
            "Parse command completed using local manifests and sqlite store.".to_string(),
            "Sequence extraction uses SEQ/RPT/RLS/TTL line heuristics from the pdftotext text layer."
                .to_string(),
        ],
    };

    write_json_pretty(&parse_manifest_path, &manifest)?;

    info!(path = %parse_manifest_path.display(), "wrote parse run manifest");
    info!(
        packets = packets_total,
        sequences = sequences_total,
        "parse run completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    cache_root: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<PacketInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(cache_root)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            packet_count = manifest.packet_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: PacketInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        packet_count = manifest.packet_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS packets (
          packet_id TEXT PRIMARY KEY,
          filename TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          base TEXT,
          fleet TEXT,
          month TEXT,
          year INTEGER,
          bid_period_start TEXT,
          bid_period_end TEXT,
          sequence_count INTEGER
        );

        CREATE TABLE IF NOT EXISTS sequences (
          sequence_row_id TEXT PRIMARY KEY,
          packet_id TEXT NOT NULL,
          sequence_number TEXT,
          position TEXT,
          instances_in_month INTEGER,
          length_days INTEGER,
          credit TEXT,
          duty_time TEXT,
          block_time TEXT,
          start_dates TEXT,
          layover_stations TEXT,
          FOREIGN KEY(packet_id) REFERENCES packets(packet_id)
        );
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

#[derive(Debug, Default)]
struct PacketParseStats {
    processed_packet_count: usize,
    sequences_parsed: usize,
    duty_days_parsed: usize,
    legs_parsed: usize,
    sequences_without_credit: usize,
    duty_days_without_report: usize,
    duty_days_without_calendar_date: usize,
    warnings: Vec<String>,
}

fn parse_packets(
    connection: &mut Connection,
    cache_root: &Path,
    parsed_dir: &Path,
    packets: &[PacketEntry],
    parser: &PacketParser,
    packet_file_filter: Option<&str>,
    max_pages_per_doc: Option<usize>,
) -> Result<PacketParseStats> {
    let tx = connection.transaction()?;
    let mut stats = PacketParseStats::default();

    {
        let mut packet_statement = tx.prepare(
            "
            INSERT INTO packets(
              packet_id, filename, sha256, base, fleet, month, year,
              bid_period_start, bid_period_end, sequence_count
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(packet_id) DO UPDATE SET
              filename=excluded.filename,
              sha256=excluded.sha256,
              base=excluded.base,
              fleet=excluded.fleet,
              month=excluded.month,
              year=excluded.year,
              bid_period_start=excluded.bid_period_start,
              bid_period_end=excluded.bid_period_end,
              sequence_count=excluded.sequence_count
            ",
        )?;

        let mut sequence_statement = tx.prepare(
            "
            INSERT INTO sequences(
              sequence_row_id, packet_id, sequence_number, position,
              instances_in_month, length_days, credit, duty_time, block_time,
              start_dates, layover_stations
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )?;

        for entry in packets {
            if let Some(only) = packet_file_filter {
                if entry.filename != only {
                    continue;
                }
            }

            stats.processed_packet_count += 1;

            let packet_path = cache_root.join(&entry.filename);
            if !packet_path.exists() {
                stats
                    .warnings
                    .push(format!("missing source packet: {}", packet_path.display()));
                continue;
            }

            let text = match extractor().extract_text(&packet_path, max_pages_per_doc) {
                Ok(text) => text,
                Err(err) => {
                    let warning =
                        format!("failed to extract text for {}: {err}", packet_path.display());
                    warn!(warning = %warning, "packet extraction warning");
                    stats.warnings.push(warning);
                    continue;
                }
            };

            let packet = parser.build_packet_from_text(&text, &entry.filename);
            let packet_id = packet_id_for(&entry.filename);

            let output_path = parsed_dir.join(format!("{packet_id}.json"));
            write_json_pretty(&output_path, &packet)?;

            tx.execute("DELETE FROM sequences WHERE packet_id = ?1", [&packet_id])?;

            packet_statement.execute(params![
                packet_id,
                &entry.filename,
                &entry.sha256,
                &packet.metadata.base,
                &packet.metadata.fleet,
                &packet.metadata.month,
                packet.metadata.year,
                &packet.metadata.bid_period_start,
                &packet.metadata.bid_period_end,
                packet.sequences.len() as i64
            ])?;

            insert_sequences(&mut sequence_statement, &packet_id, &packet)?;
            record_packet_stats(&mut stats, &packet);

            info!(
                path = %output_path.display(),
                sequences = packet.sequences.len(),
                "parsed bid packet"
            );
        }
    }

    tx.commit()?;
    Ok(stats)
}

fn insert_sequences(
    statement: &mut rusqlite::Statement<'_>,
    packet_id: &str,
    packet: &UploadedBidPacket,
) -> Result<()> {
    for (index, sequence) in packet.sequences.iter().enumerate() {
        let sequence_row_id = format!(
            "{}:{}:{:03}",
            packet_id,
            sequence.sequence_number,
            index + 1
        );

        let start_dates = serde_json::to_string(&sequence.calendar.start_dates)
            .context("failed to serialize sequence start dates")?;

        let layover_stations: BTreeSet<String> = sequence
            .duty_days
            .iter()
            .filter_map(|day| {
                day.layover
                    .as_ref()
                    .and_then(|layover| layover.station.clone())
            })
            .collect();
        let layover_stations = layover_stations.into_iter().collect::<Vec<String>>().join(" ");

        statement.execute(params![
            sequence_row_id,
            packet_id,
            &sequence.sequence_number,
            &sequence.position,
            sequence.instances_in_month,
            sequence.length_days as i64,
            &sequence.credit,
            &sequence.duty_time,
            &sequence.block_time,
            start_dates,
            layover_stations
        ])?;
    }

    Ok(())
}

fn record_packet_stats(stats: &mut PacketParseStats, packet: &UploadedBidPacket) {
    stats.sequences_parsed += packet.sequences.len();

    for sequence in &packet.sequences {
        if sequence.credit.is_none() {
            stats.sequences_without_credit += 1;
        }

        stats.duty_days_parsed += sequence.duty_days.len();
        for day in &sequence.duty_days {
            stats.legs_parsed += day.legs.len();
            if day.report_time.is_none() {
                stats.duty_days_without_report += 1;
            }
            if day.calendar_date.is_none() {
                stats.duty_days_without_calendar_date += 1;
            }
        }
    }
}

fn packet_id_for(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
        .to_string()
}

fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

fn collect_tool_versions() -> Result<ToolVersions> {
    Ok(ToolVersions {
        rustc: command_version("rustc", &["--version"])?,
        cargo: command_version("cargo", &["--version"])?,
        pdftotext: command_version("pdftotext", &["-v"])?,
    })
}

fn command_version(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program, args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} {} failed: {}", program, args.join(" "), stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    let version_line = source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .unwrap_or("unknown");

    Ok(version_line.to_string())
}

fn render_parse_command(args: &ParseArgs) -> String {
    let mut command = vec![
        "bidpacket".to_string(),
        "parse".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.parse_manifest_path {
        command.push("--parse-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.parsed_dir {
        command.push("--parsed-dir".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    if let Some(packet_file) = &args.packet_file {
        command.push("--packet-file".to_string());
        command.push(packet_file.clone());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }

    command.join(" ")
}
