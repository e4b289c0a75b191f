use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;

use crate::packet::duty::{SequenceDutyDay, group_duty_days};
use crate::packet::lines::LineClassifier;

#[derive(Debug, Clone, Default)]
pub struct SequenceTotals {
    pub credit: Option<f64>,
    pub duty_hours: Option<f64>,
    pub block_hours: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct SequenceRecord {
    pub sequence_number: String,
    pub instances_in_month: Option<u32>,
    pub positions: Option<BTreeMap<String, u32>>,
    pub totals: Option<SequenceTotals>,
    pub duty_days: Vec<SequenceDutyDay>,
}

#[derive(Debug)]
pub struct SequenceParser {
    position_token: Regex,
    ttl_value: Regex,
    duty_value: Regex,
    blk_value: Regex,
}

impl SequenceParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            position_token: Regex::new(r"^(CA|FO|RL|AP|RS)(\d+)")
                .context("failed to compile position token regex")?,
            ttl_value: Regex::new(r"\bTTL\s+(\d+(?:\.\d+)?)")
                .context("failed to compile TTL value regex")?,
            duty_value: Regex::new(r"(?i)\bDUTY\s+(\d+(?:\.\d+)?)")
                .context("failed to compile DUTY value regex")?,
            blk_value: Regex::new(r"(?i)\bBLK\s+(\d+(?:\.\d+)?)")
                .context("failed to compile BLK value regex")?,
        })
    }

    pub fn parse_block(&self, classifier: &LineClassifier, block: &[String]) -> SequenceRecord {
        let Some((header, rest)) = block.split_first() else {
            return SequenceRecord::default();
        };

        let mut record = self.parse_header(header);

        let totals_index = rest.iter().position(|line| classifier.has_totals(line));
        let duty_lines = match totals_index {
            Some(index) => &rest[..index],
            None => rest,
        };

        record.duty_days = group_duty_days(classifier, duty_lines);
        record.totals = totals_index.map(|index| self.parse_totals(&rest[index]));

        record
    }

    fn parse_header(&self, header: &str) -> SequenceRecord {
        let tokens: Vec<&str> = header.split_whitespace().collect();

        let sequence_number = match tokens.get(1) {
            Some(token) => (*token).to_string(),
            None => tokens
                .first()
                .map(|token| token.chars().filter(char::is_ascii_digit).collect::<String>())
                .unwrap_or_default(),
        };

        let mut instances_in_month = None;
        let mut positions: BTreeMap<String, u32> = BTreeMap::new();

        for token in tokens.iter().skip(2) {
            if instances_in_month.is_none()
                && !token.is_empty()
                && token.chars().all(|c| c.is_ascii_digit())
            {
                instances_in_month = token.parse::<u32>().ok();
                continue;
            }

            if let Some(captures) = self.position_token.captures(token) {
                let code = captures[1].to_string();
                if let Ok(count) = captures[2].parse::<u32>() {
                    positions.insert(code, count);
                }
            }
        }

        SequenceRecord {
            sequence_number,
            instances_in_month,
            positions: if positions.is_empty() {
                None
            } else {
                Some(positions)
            },
            totals: None,
            duty_days: Vec::new(),
        }
    }

    fn parse_totals(&self, line: &str) -> SequenceTotals {
        SequenceTotals {
            credit: capture_value(&self.ttl_value, line),
            duty_hours: capture_value(&self.duty_value, line),
            block_hours: capture_value(&self.blk_value, line),
        }
    }
}

fn capture_value(pattern: &Regex, line: &str) -> Option<f64> {
    pattern.captures(line)?.get(1)?.as_str().parse::<f64>().ok()
}
