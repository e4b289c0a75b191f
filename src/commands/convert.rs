use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ConvertArgs;
use crate::packet::{parse_bid_packet, parse_bid_packet_file};
use crate::util::write_json_pretty;

pub fn run(args: ConvertArgs) -> Result<()> {
    let packet = if args.packet_path.as_os_str() == "-" {
        let mut document_bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut document_bytes)
            .context("failed to read packet bytes from stdin")?;

        let source_name = args
            .source_name
            .clone()
            .context("--source-name is required when reading from stdin")?;

        parse_bid_packet(&document_bytes, &source_name)?
    } else {
        parse_bid_packet_file(&args.packet_path)?
    };

    match &args.output_path {
        Some(path) => {
            write_json_pretty(path, &packet)?;
            info!(
                path = %path.display(),
                sequences = packet.sequences.len(),
                "wrote parsed packet"
            );
        }
        None => {
            let data = serde_json::to_vec_pretty(&packet)
                .context("failed to serialize parsed packet")?;
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&data)
                .context("failed to write parsed packet")?;
            stdout
                .write_all(b"\n")
                .context("failed to write parsed packet")?;
        }
    }

    Ok(())
}
