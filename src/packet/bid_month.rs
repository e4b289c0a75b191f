use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use regex::Regex;

pub const UNKNOWN_MONTH: &str = "UNKNOWN";

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidMonth {
    pub month: String,
    pub year: i32,
    pub month_index: Option<u32>,
}

type MatcherFn = fn(&MonthYearInferencer, &[String], &str) -> Option<BidMonth>;

#[derive(Debug)]
pub struct MonthYearInferencer {
    fdp_calendar: Regex,
    four_digit_year: Regex,
    full_month_year: Regex,
    compact_date: Regex,
    bare_month_year: Regex,
    file_name_month_year: Regex,
}

impl MonthYearInferencer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fdp_calendar: Regex::new(r"FDP CALENDAR\s+(\S+)")
                .context("failed to compile FDP calendar regex")?,
            four_digit_year: Regex::new(r"\b(\d{4})\b")
                .context("failed to compile four digit year regex")?,
            full_month_year: Regex::new(
                r"\b(JANUARY|FEBRUARY|MARCH|APRIL|MAY|JUNE|JULY|AUGUST|SEPTEMBER|OCTOBER|NOVEMBER|DECEMBER)\s+(\d{4})\b",
            )
            .context("failed to compile full month name regex")?,
            compact_date: Regex::new(
                r"\b\d{2}(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)(\d{4})\b",
            )
            .context("failed to compile compact date regex")?,
            bare_month_year: Regex::new(
                r"\b(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)\s+(\d{4})\b",
            )
            .context("failed to compile bare month year regex")?,
            file_name_month_year: Regex::new(
                r"(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)(\d{4})",
            )
            .context("failed to compile file name month year regex")?,
        })
    }

    // Precedence runs from the most authoritative phrasing down to the file
    // name, then the current-year fallback.
    pub fn infer(&self, pages: &[String], file_name: &str) -> BidMonth {
        let matchers: [MatcherFn; 5] = [
            Self::from_fdp_calendar_page,
            Self::from_full_month_name,
            Self::from_compact_date_token,
            Self::from_bare_month_year,
            Self::from_file_name_token,
        ];

        for matcher in matchers {
            if let Some(found) = matcher(self, pages, file_name) {
                return found;
            }
        }

        BidMonth {
            month: UNKNOWN_MONTH.to_string(),
            year: Utc::now().year(),
            month_index: None,
        }
    }

    pub fn month_from_file_name(&self, file_name: &str) -> Option<BidMonth> {
        self.from_file_name_token(&[], file_name)
    }

    fn from_fdp_calendar_page(&self, pages: &[String], _file_name: &str) -> Option<BidMonth> {
        for page in pages {
            let Some(captures) = self.fdp_calendar.captures(page) else {
                continue;
            };

            let token = captures[1].to_string();
            let segment = token.split(['/', '-']).next().unwrap_or_default();
            let prefix: String = segment.chars().take(2).collect();
            let Ok(month_number) = prefix.parse::<u32>() else {
                continue;
            };
            if !(1..=12).contains(&month_number) {
                continue;
            }

            let Some(year_captures) = self.four_digit_year.captures(page) else {
                continue;
            };
            let Ok(year) = year_captures[1].parse::<i32>() else {
                continue;
            };

            return Some(BidMonth {
                month: MONTH_ABBREVIATIONS[(month_number - 1) as usize].to_string(),
                year,
                month_index: Some(month_number),
            });
        }

        None
    }

    fn from_full_month_name(&self, pages: &[String], _file_name: &str) -> Option<BidMonth> {
        for page in pages {
            let Some(captures) = self.full_month_year.captures(page) else {
                continue;
            };

            let month: String = captures[1].chars().take(3).collect();
            let Ok(year) = captures[2].parse::<i32>() else {
                continue;
            };

            return Some(month_and_year(&month, year));
        }

        None
    }

    fn from_compact_date_token(&self, pages: &[String], _file_name: &str) -> Option<BidMonth> {
        for page in pages {
            let Some(captures) = self.compact_date.captures(page) else {
                continue;
            };

            let month = captures[1].to_string();
            let Ok(year) = captures[2].parse::<i32>() else {
                continue;
            };

            return Some(month_and_year(&month, year));
        }

        None
    }

    fn from_bare_month_year(&self, pages: &[String], _file_name: &str) -> Option<BidMonth> {
        for page in pages {
            let Some(captures) = self.bare_month_year.captures(page) else {
                continue;
            };

            let month = captures[1].to_string();
            let Ok(year) = captures[2].parse::<i32>() else {
                continue;
            };

            return Some(month_and_year(&month, year));
        }

        None
    }

    fn from_file_name_token(&self, _pages: &[String], file_name: &str) -> Option<BidMonth> {
        let captures = self.file_name_month_year.captures(file_name)?;

        let month = captures[1].to_string();
        let year = captures[2].parse::<i32>().ok()?;

        Some(month_and_year(&month, year))
    }
}

fn month_and_year(month: &str, year: i32) -> BidMonth {
    BidMonth {
        month: month.to_string(),
        year,
        month_index: month_index_for(month),
    }
}

fn month_index_for(month: &str) -> Option<u32> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbreviation| *abbreviation == month)
        .map(|index| (index + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::{MonthYearInferencer, UNKNOWN_MONTH};

    fn inferencer() -> MonthYearInferencer {
        MonthYearInferencer::new().expect("month inference regexes should compile")
    }

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|text| (*text).to_string()).collect()
    }

    #[test]
    fn fdp_calendar_header_resolves_month_and_same_page_year() {
        let inferred = inferencer().infer(
            &pages(&["FDP CALENDAR 12/01-12/31 EFFECTIVE 2025"]),
            "packet.pdf",
        );

        assert_eq!(inferred.month, "DEC");
        assert_eq!(inferred.year, 2025);
        assert_eq!(inferred.month_index, Some(12));
    }

    #[test]
    fn fdp_calendar_page_outranks_the_file_name() {
        let inferred = inferencer().infer(
            &pages(&["FDP CALENDAR 03/01-03/31 BID YEAR 2026"]),
            "BOS_737_DEC2025.pdf",
        );

        assert_eq!(inferred.month, "MAR");
        assert_eq!(inferred.year, 2026);
    }

    #[test]
    fn full_month_name_with_year_is_reduced_to_an_abbreviation() {
        let inferred = inferencer().infer(&pages(&["BID PACKET FOR DECEMBER 2025"]), "packet.pdf");

        assert_eq!(inferred.month, "DEC");
        assert_eq!(inferred.year, 2025);
        assert_eq!(inferred.month_index, Some(12));
    }

    #[test]
    fn compact_date_tokens_resolve_month_and_year() {
        let inferred = inferencer().infer(&pages(&["EFFECTIVE 01DEC2025 THROUGH END"]), "packet.pdf");

        assert_eq!(inferred.month, "DEC");
        assert_eq!(inferred.year, 2025);
    }

    #[test]
    fn bare_month_abbreviation_with_year_is_the_loosest_page_cue() {
        let inferred = inferencer().infer(&pages(&["DEC 2025 FINAL"]), "packet.pdf");

        assert_eq!(inferred.month, "DEC");
        assert_eq!(inferred.year, 2025);
    }

    #[test]
    fn file_name_is_the_last_resort_before_the_fallback() {
        let inferred = inferencer().infer(&pages(&["NO USABLE CUES HERE"]), "BOS_737_DEC2025.pdf");

        assert_eq!(inferred.month, "DEC");
        assert_eq!(inferred.year, 2025);
        assert_eq!(inferred.month_index, Some(12));
    }

    #[test]
    fn unmatched_input_falls_back_to_the_unknown_month_sentinel() {
        let inferred = inferencer().infer(&pages(&["NOTHING DATED"]), "packet.pdf");

        assert_eq!(inferred.month, UNKNOWN_MONTH);
        assert_eq!(inferred.month_index, None);
    }
}
