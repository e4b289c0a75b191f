use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketEntry {
    pub filename: String,
    pub base: String,
    pub fleet: String,
    pub month: String,
    pub year: Option<i32>,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub packet_count: usize,
    pub packets: Vec<PacketEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub rustc: String,
    pub cargo: String,
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsePaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
    pub parsed_dir: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseCounts {
    pub packet_count: usize,
    pub processed_packet_count: usize,
    pub packets_total: i64,
    pub sequences_total: i64,
    pub sequences_parsed: usize,
    pub duty_days_parsed: usize,
    pub legs_parsed: usize,
    pub sequences_without_credit: usize,
    pub duty_days_without_report: usize,
    pub duty_days_without_calendar_date: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: ParsePaths,
    pub counts: ParseCounts,
    pub source_hashes: Vec<PacketEntry>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseRunSummary {
    pub run_id: Option<String>,
    pub status: Option<String>,
    pub started_at: Option<String>,
    pub updated_at: Option<String>,
    pub warnings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedBidPacket {
    pub metadata: PacketMetadata,
    pub sequences: Vec<UploadedSequence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketMetadata {
    pub base: String,
    pub fleet: String,
    pub month: String,
    pub year: i32,
    pub bid_period_start: Option<String>,
    pub bid_period_end: Option<String>,
    pub source_document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedSequence {
    pub sequence_number: String,
    pub position: String,
    pub instances_in_month: Option<u32>,
    pub length_days: usize,
    pub credit: Option<String>,
    pub duty_time: Option<String>,
    pub block_time: Option<String>,
    pub calendar: SequenceCalendar,
    pub duty_days: Vec<UploadedDutyDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceCalendar {
    pub start_dates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDutyDay {
    pub duty_index: usize,
    pub calendar_date: Option<String>,
    pub report_time: Option<String>,
    pub release_time: Option<String>,
    pub legs: Vec<UploadedLeg>,
    pub layover: Option<Layover>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedLeg {
    pub leg_index: usize,
    pub day: Option<String>,
    pub flight_number: Option<String>,
    pub equipment: Option<String>,
    pub departure_station: Option<String>,
    pub departure_time: Option<String>,
    pub meal: Option<String>,
    pub arrival_station: Option<String>,
    pub arrival_time: Option<String>,
    pub block_time: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layover {
    pub station: Option<String>,
    pub hotel: Option<String>,
    pub ground_rest: Option<String>,
}
