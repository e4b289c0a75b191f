use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    SequenceStart,
    FlightLeg,
    Report,
    Release,
    Hotel,
    Totals,
    Other,
}

#[derive(Debug)]
pub struct LineClassifier {
    sequence_start: Regex,
    flight_leg: Regex,
    report: Regex,
    release: Regex,
    hotel: Regex,
    totals: Regex,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            sequence_start: Regex::new(r"^SEQ\b")
                .context("failed to compile sequence start regex")?,
            flight_leg: Regex::new(r"^\d+\s+\d+/\d+\s+\d+\s+\d+")
                .context("failed to compile flight leg regex")?,
            report: Regex::new(r"^RPT\b").context("failed to compile report regex")?,
            release: Regex::new(r"^RLS\b").context("failed to compile release regex")?,
            hotel: Regex::new(r"(?i)HOTEL").context("failed to compile hotel regex")?,
            totals: Regex::new(r"\bTTL\b").context("failed to compile totals regex")?,
        })
    }

    pub fn is_sequence_start(&self, line: &str) -> bool {
        self.sequence_start.is_match(line)
    }

    pub fn is_flight_leg(&self, line: &str) -> bool {
        self.flight_leg.is_match(line)
    }

    pub fn is_report(&self, line: &str) -> bool {
        self.report.is_match(line)
    }

    pub fn is_release(&self, line: &str) -> bool {
        self.release.is_match(line)
    }

    pub fn is_hotel(&self, line: &str) -> bool {
        self.hotel.is_match(line)
    }

    pub fn has_totals(&self, line: &str) -> bool {
        self.totals.is_match(line)
    }

    pub fn classify(&self, line: &str) -> LineKind {
        if self.is_sequence_start(line) {
            LineKind::SequenceStart
        } else if self.is_flight_leg(line) {
            LineKind::FlightLeg
        } else if self.is_report(line) {
            LineKind::Report
        } else if self.is_release(line) {
            LineKind::Release
        } else if self.is_hotel(line) {
            LineKind::Hotel
        } else if self.has_totals(line) {
            LineKind::Totals
        } else {
            LineKind::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LineClassifier, LineKind};

    fn classifier() -> LineClassifier {
        LineClassifier::new().expect("classifier regexes should compile")
    }

    #[test]
    fn classifies_sequence_start_lines() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("SEQ 1234 2 CA2 FO1"),
            LineKind::SequenceStart
        );
        assert_eq!(classifier.classify("SEQUEL OF NOTES"), LineKind::Other);
    }

    #[test]
    fn classifies_flight_leg_lines_by_leading_token_shape() {
        let classifier = classifier();
        assert_eq!(
            classifier.classify("1 12/25 737 1234 BOS 0700 E LGA 0815 1.15"),
            LineKind::FlightLeg
        );
        assert_eq!(classifier.classify("1 12/25 ORD"), LineKind::Other);
    }

    #[test]
    fn classifies_report_release_and_hotel_lines() {
        let classifier = classifier();
        assert_eq!(classifier.classify("RPT 0600"), LineKind::Report);
        assert_eq!(classifier.classify("RLS 0900/0845"), LineKind::Release);
        assert_eq!(
            classifier.classify("ORD Marriott Hotel Downtown 14.30"),
            LineKind::Hotel
        );
    }

    #[test]
    fn totals_marker_requires_word_boundary() {
        let classifier = classifier();
        assert!(classifier.has_totals("TTL 12.30 DUTY 9.15 BLK 8.00"));
        assert!(!classifier.has_totals("SUBTTLX 4.00"));
    }

    #[test]
    fn report_and_release_markers_must_lead_the_line() {
        let classifier = classifier();
        assert_eq!(classifier.classify("SEE RPT 0600"), LineKind::Other);
        assert_eq!(classifier.classify("RLSX 0900"), LineKind::Other);
    }
}
