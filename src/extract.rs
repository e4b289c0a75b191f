use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::util::sha256_bytes;

static EXTRACTOR: OnceLock<TextExtractor> = OnceLock::new();

pub fn extractor() -> &'static TextExtractor {
    EXTRACTOR.get_or_init(TextExtractor::new)
}

#[derive(Debug, Clone)]
pub struct TextExtractor {
    program: PathBuf,
}

impl TextExtractor {
    fn new() -> Self {
        Self {
            program: PathBuf::from("pdftotext"),
        }
    }

    pub fn extract_text(&self, packet_path: &Path, max_pages: Option<usize>) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
        if let Some(max_pages) = max_pages {
            command.arg("-l").arg(max_pages.to_string());
        }
        command.arg(packet_path).arg("-");

        let output = command
            .output()
            .with_context(|| format!("failed to execute pdftotext for {}", packet_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {}: {}",
                packet_path.display(),
                stderr.trim()
            );
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        Ok(raw.replace('\u{0000}', ""))
    }

    pub fn extract_text_from_bytes(&self, document_bytes: &[u8]) -> Result<String> {
        let digest = sha256_bytes(document_bytes);
        let staged_path = std::env::temp_dir().join(format!("bidpacket-{}.pdf", &digest[..16]));

        fs::write(&staged_path, document_bytes)
            .with_context(|| format!("failed to stage document at {}", staged_path.display()))?;

        let extracted = self.extract_text(&staged_path, None);

        if let Err(err) = fs::remove_file(&staged_path) {
            warn!(path = %staged_path.display(), error = %err, "failed to remove staged document");
        }

        extracted
    }
}
