use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;

use crate::extract::extractor;
use crate::model::{
    Layover, PacketMetadata, SequenceCalendar, UploadedBidPacket, UploadedDutyDay, UploadedLeg,
    UploadedSequence,
};
use crate::packet::bid_month::{BidMonth, MonthYearInferencer};
use crate::packet::blocks::split_sequence_blocks;
use crate::packet::clock::{hours_to_clock, parse_clock, resolve_calendar_date};
use crate::packet::duty::SequenceDutyDay;
use crate::packet::leg::FlightLeg;
use crate::packet::lines::LineClassifier;
use crate::packet::sequence::{SequenceParser, SequenceRecord};

pub const UNKNOWN_METADATA: &str = "UNKNOWN";

pub fn parse_bid_packet(document_bytes: &[u8], source_file_name: &str) -> Result<UploadedBidPacket> {
    let parser = PacketParser::new()?;
    let text = extractor().extract_text_from_bytes(document_bytes)?;
    Ok(parser.build_packet_from_text(&text, source_file_name))
}

pub fn parse_bid_packet_file(path: &Path) -> Result<UploadedBidPacket> {
    let parser = PacketParser::new()?;
    let source_file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid packet file name: {}", path.display()))?;
    let text = extractor().extract_text(path, None)?;
    Ok(parser.build_packet_from_text(&text, &source_file_name))
}

pub fn split_pages(raw_text: &str) -> Vec<String> {
    let normalized = raw_text.replace("\r\n", "\n");

    normalized
        .split('\u{000C}')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Debug)]
pub struct PacketParser {
    classifier: LineClassifier,
    sequences: SequenceParser,
    months: MonthYearInferencer,
    base_fleet: Regex,
    phone_like: Regex,
    ground_rest: Regex,
}

impl PacketParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: LineClassifier::new()?,
            sequences: SequenceParser::new()?,
            months: MonthYearInferencer::new()?,
            base_fleet: Regex::new(r"([A-Za-z]{3})_(\d{3})")
                .context("failed to compile base/fleet file name regex")?,
            phone_like: Regex::new(r"^[()0-9-]{7,}$")
                .context("failed to compile phone number regex")?,
            ground_rest: Regex::new(r"^(\d+\.\d+|\d{3,4})$")
                .context("failed to compile ground rest regex")?,
        })
    }

    pub fn build_packet_from_text(
        &self,
        raw_text: &str,
        source_file_name: &str,
    ) -> UploadedBidPacket {
        let mut pages = split_pages(raw_text);
        if pages.is_empty() {
            pages.push(raw_text.replace("\r\n", "\n"));
        }

        let (base, fleet) = self.file_name_metadata(source_file_name);
        let bid_month = self.months.infer(&pages, source_file_name);
        let (bid_period_start, bid_period_end) = bid_period_window(&bid_month);

        let mut sequences = Vec::new();
        for page in &pages {
            let lines: Vec<String> = page
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(ToOwned::to_owned)
                .collect();

            for block in split_sequence_blocks(&self.classifier, &lines) {
                let record = self.sequences.parse_block(&self.classifier, &block);
                sequences.push(self.normalize_sequence(record, &bid_month));
            }
        }

        UploadedBidPacket {
            metadata: PacketMetadata {
                base,
                fleet,
                month: bid_month.month.clone(),
                year: bid_month.year,
                bid_period_start,
                bid_period_end,
                source_document: source_file_name.to_string(),
            },
            sequences,
        }
    }

    fn file_name_metadata(&self, file_name: &str) -> (String, String) {
        match self.base_fleet.captures(file_name) {
            Some(captures) => (captures[1].to_ascii_uppercase(), captures[2].to_string()),
            None => (
                UNKNOWN_METADATA.to_string(),
                UNKNOWN_METADATA.to_string(),
            ),
        }
    }

    fn normalize_sequence(&self, record: SequenceRecord, bid_month: &BidMonth) -> UploadedSequence {
        let position = match &record.positions {
            Some(positions) if !positions.is_empty() => {
                positions.keys().cloned().collect::<Vec<String>>().join(" ")
            }
            _ => "Unknown".to_string(),
        };

        let mut start_dates = BTreeSet::new();
        let mut duty_days = Vec::with_capacity(record.duty_days.len());

        for (index, day) in record.duty_days.iter().enumerate() {
            let calendar_date = day.calendar_day.as_deref().and_then(|token| {
                let month_index = bid_month.month_index?;
                resolve_calendar_date(token, month_index, bid_month.year)
            });

            if let Some(date) = &calendar_date {
                start_dates.insert(date.clone());
            }

            duty_days.push(UploadedDutyDay {
                duty_index: index + 1,
                calendar_date,
                report_time: parse_clock(day.report_time.as_deref()),
                release_time: parse_clock(day.release_time.as_deref()),
                legs: day
                    .legs
                    .iter()
                    .enumerate()
                    .map(|(leg_index, leg)| normalize_leg(leg_index + 1, leg))
                    .collect(),
                layover: self.extract_layover(day),
                summary: day.summary.clone(),
            });
        }

        let totals = record.totals.as_ref();

        UploadedSequence {
            sequence_number: record.sequence_number,
            position,
            instances_in_month: record.instances_in_month,
            length_days: record.duty_days.len(),
            credit: hours_to_clock(totals.and_then(|value| value.credit)),
            duty_time: hours_to_clock(totals.and_then(|value| value.duty_hours)),
            block_time: hours_to_clock(totals.and_then(|value| value.block_hours)),
            calendar: SequenceCalendar {
                start_dates: start_dates.into_iter().collect(),
            },
            duty_days,
        }
    }

    fn extract_layover(&self, day: &SequenceDutyDay) -> Option<Layover> {
        let line = day.hotel_layover.as_deref()?;
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let mut start = 0_usize;
        let mut end = tokens.len();

        let station = match tokens.first() {
            Some(token) if is_station_code(token) => {
                start = 1;
                Some((*token).to_string())
            }
            _ => day
                .legs
                .last()
                .and_then(|leg| leg.arrival_station.clone()),
        };

        let ground_rest = match tokens.last() {
            Some(token) if end > start && self.ground_rest.is_match(token) => {
                end -= 1;
                normalize_rest_token(token)
            }
            _ => None,
        };

        let hotel_tokens: Vec<&str> = tokens[start..end]
            .iter()
            .copied()
            .filter(|token| !self.phone_like.is_match(token))
            .collect();

        Some(Layover {
            station,
            hotel: if hotel_tokens.is_empty() {
                None
            } else {
                Some(hotel_tokens.join(" "))
            },
            ground_rest,
        })
    }
}

fn normalize_leg(leg_index: usize, leg: &FlightLeg) -> UploadedLeg {
    UploadedLeg {
        leg_index,
        day: leg.day.clone(),
        flight_number: leg.flight_number.clone(),
        equipment: leg.equipment.clone(),
        departure_station: leg.departure_station.clone(),
        departure_time: parse_clock(leg.departure_time.as_deref()),
        meal: leg.meal.clone(),
        arrival_station: leg.arrival_station.clone(),
        arrival_time: parse_clock(leg.arrival_time.as_deref()),
        block_time: hours_to_clock(
            leg.block_time
                .as_deref()
                .and_then(|token| token.parse::<f64>().ok()),
        ),
        remarks: leg.remarks.clone(),
    }
}

fn bid_period_window(bid_month: &BidMonth) -> (Option<String>, Option<String>) {
    let Some(month_index) = bid_month.month_index else {
        return (None, None);
    };
    let Some(start) = NaiveDate::from_ymd_opt(bid_month.year, month_index, 1) else {
        return (None, None);
    };

    let next_month_start = if month_index == 12 {
        NaiveDate::from_ymd_opt(bid_month.year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(bid_month.year, month_index + 1, 1)
    };
    let end = next_month_start.and_then(|date| date.pred_opt());

    (
        Some(start.format("%Y-%m-%d").to_string()),
        end.map(|date| date.format("%Y-%m-%d").to_string()),
    )
}

fn is_station_code(token: &str) -> bool {
    token.len() == 3 && token.chars().all(|c| c.is_ascii_uppercase())
}

fn normalize_rest_token(token: &str) -> Option<String> {
    if token.contains('.') {
        hours_to_clock(token.parse::<f64>().ok())
    } else {
        parse_clock(Some(token))
    }
}

#[cfg(test)]
mod tests {
    use super::{PacketParser, split_pages};

    fn parser() -> PacketParser {
        PacketParser::new().expect("packet parser patterns should compile")
    }

    const SAMPLE_PACKET: &str = "FDP CALENDAR 12/01-12/31 EFFECTIVE 2025\n\
\u{000C}\
SEQ 1234 2 CA2 FO1\n\
RPT 0600\n\
1 12/25 737 1234 BOS 0700 E LGA 0815 1.15\n\
RLS 0900\n\
LGA AIRPORT HOTEL PLAZA 2125551234 14.30\n\
TTL 12.30 DUTY 9.15 BLK 8.00\n\
SEQ 1235 1 CA1\n\
RPT 0700\n\
1 12/26 320 987 BOS 0800 ORD 1015 2.15\n\
2 12/27 320 988 ORD 0900 BOS 1115 2.15\n\
TTL 10.00 DUTY 8.00 BLK 4.30\n";

    #[test]
    fn split_pages_normalizes_line_endings_and_drops_blank_pages() {
        let pages = split_pages("first page\r\nsecond line\u{000C}\u{000C}   \u{000C}last page");

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], "first page\nsecond line");
        assert_eq!(pages[1], "last page");
    }

    #[test]
    fn file_name_metadata_uses_the_base_fleet_pattern() {
        let parser = parser();

        assert_eq!(
            parser.file_name_metadata("bos_737_DEC2025.pdf"),
            ("BOS".to_string(), "737".to_string())
        );
        assert_eq!(
            parser.file_name_metadata("packet.pdf"),
            ("UNKNOWN".to_string(), "UNKNOWN".to_string())
        );
    }

    #[test]
    fn builds_a_full_packet_from_sample_text() {
        let packet = parser().build_packet_from_text(SAMPLE_PACKET, "BOS_737_DEC2025.pdf");

        assert_eq!(packet.metadata.base, "BOS");
        assert_eq!(packet.metadata.fleet, "737");
        assert_eq!(packet.metadata.month, "DEC");
        assert_eq!(packet.metadata.year, 2025);
        assert_eq!(packet.metadata.bid_period_start.as_deref(), Some("2025-12-01"));
        assert_eq!(packet.metadata.bid_period_end.as_deref(), Some("2025-12-31"));

        assert_eq!(packet.sequences.len(), 2);

        let first = &packet.sequences[0];
        assert_eq!(first.sequence_number, "1234");
        assert_eq!(first.position, "CA FO");
        assert_eq!(first.instances_in_month, Some(2));
        assert_eq!(first.length_days, 1);
        assert_eq!(first.credit.as_deref(), Some("12:18"));
        assert_eq!(first.duty_time.as_deref(), Some("09:09"));
        assert_eq!(first.block_time.as_deref(), Some("08:00"));
        assert_eq!(first.calendar.start_dates, vec!["2025-12-25".to_string()]);

        let day = &first.duty_days[0];
        assert_eq!(day.duty_index, 1);
        assert_eq!(day.calendar_date.as_deref(), Some("2025-12-25"));
        assert_eq!(day.report_time.as_deref(), Some("06:00"));
        assert_eq!(day.release_time.as_deref(), Some("09:00"));
        assert_eq!(day.legs.len(), 1);
        assert_eq!(day.legs[0].leg_index, 1);
        assert_eq!(day.legs[0].departure_time.as_deref(), Some("07:00"));
        assert_eq!(day.legs[0].arrival_time.as_deref(), Some("08:15"));
        assert_eq!(day.legs[0].meal.as_deref(), Some("E"));

        let layover = day.layover.as_ref().expect("layover should be present");
        assert_eq!(layover.station.as_deref(), Some("LGA"));
        assert_eq!(layover.hotel.as_deref(), Some("AIRPORT HOTEL PLAZA"));
        assert_eq!(layover.ground_rest.as_deref(), Some("14:18"));

        let second = &packet.sequences[1];
        assert_eq!(second.sequence_number, "1235");
        assert_eq!(second.position, "CA");
        assert_eq!(second.length_days, 2);
        assert_eq!(
            second.calendar.start_dates,
            vec!["2025-12-26".to_string(), "2025-12-27".to_string()]
        );
        assert!(second.duty_days[0].layover.is_none());
    }

    #[test]
    fn parsing_the_same_text_twice_is_idempotent() {
        let parser = parser();
        let first = parser.build_packet_from_text(SAMPLE_PACKET, "BOS_737_DEC2025.pdf");
        let second = parser.build_packet_from_text(SAMPLE_PACKET, "BOS_737_DEC2025.pdf");

        let first_json = serde_json::to_string(&first).expect("packet should serialize");
        let second_json = serde_json::to_string(&second).expect("packet should serialize");
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn parses_a_packet_without_form_feed_page_breaks() {
        let packet = parser().build_packet_from_text(
            "SEQ 77 1 FO1\nRPT 0500\n1 12/02 737 455 BOS 0600 DCA 0730 1.30\nTTL 5.00",
            "packet.pdf",
        );

        assert_eq!(packet.sequences.len(), 1);
        assert_eq!(packet.sequences[0].sequence_number, "77");
    }

    #[test]
    fn layover_station_falls_back_to_the_last_arrival_station() {
        let parser = parser();
        let packet = parser.build_packet_from_text(
            "SEQ 88 1 CA1\nRPT 0600\n1 12/05 737 20 BOS 0700 SFO 1030 6.30\nHotel Nikko 4155550123\nTTL 9.00",
            "BOS_737_DEC2025.pdf",
        );

        let layover = packet.sequences[0].duty_days[0]
            .layover
            .as_ref()
            .expect("layover should be present");
        assert_eq!(layover.station.as_deref(), Some("SFO"));
        assert_eq!(layover.hotel.as_deref(), Some("Hotel Nikko"));
        assert!(layover.ground_rest.is_none());
    }
}
