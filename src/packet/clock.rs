use chrono::NaiveDate;

pub fn hours_to_clock(hours: Option<f64>) -> Option<String> {
    let value = hours?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let total_minutes = (value * 60.0).round() as u64;
    Some(format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60))
}

pub fn parse_clock(raw: Option<&str>) -> Option<String> {
    let token = raw?.trim();
    let digits = token.split('/').next().unwrap_or_default();
    if digits.len() < 3 || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let padded = format!("{digits:0>4}");
    Some(format!("{}:{}", &padded[..2], &padded[2..]))
}

pub fn resolve_calendar_date(token: &str, month_index: u32, year: i32) -> Option<String> {
    let mut segments = token.split('/');
    let first = segments.next();
    let second = segments.next();

    let day = second
        .and_then(parse_day_number)
        .or_else(|| first.and_then(parse_day_number))?;

    let date = NaiveDate::from_ymd_opt(year, month_index, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn parse_day_number(segment: &str) -> Option<u32> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::{hours_to_clock, parse_clock, resolve_calendar_date};

    #[test]
    fn hours_to_clock_converts_decimal_hours_to_minutes() {
        assert_eq!(hours_to_clock(Some(1.5)).as_deref(), Some("01:30"));
        assert_eq!(hours_to_clock(Some(0.0)).as_deref(), Some("00:00"));
        assert_eq!(hours_to_clock(Some(12.30)).as_deref(), Some("12:18"));
    }

    #[test]
    fn hours_to_clock_rejects_absent_and_non_finite_input() {
        assert_eq!(hours_to_clock(None), None);
        assert_eq!(hours_to_clock(Some(f64::NAN)), None);
        assert_eq!(hours_to_clock(Some(f64::INFINITY)), None);
    }

    #[test]
    fn parse_clock_pads_three_digit_tokens() {
        assert_eq!(parse_clock(Some("1630")).as_deref(), Some("16:30"));
        assert_eq!(parse_clock(Some("930")).as_deref(), Some("09:30"));
    }

    #[test]
    fn parse_clock_uses_the_segment_before_a_slash() {
        assert_eq!(parse_clock(Some("0600/0615")).as_deref(), Some("06:00"));
    }

    #[test]
    fn parse_clock_rejects_empty_and_non_numeric_tokens() {
        assert_eq!(parse_clock(Some("")), None);
        assert_eq!(parse_clock(None), None);
        assert_eq!(parse_clock(Some("16305")), None);
        assert_eq!(parse_clock(Some("AB30")), None);
    }

    #[test]
    fn resolve_calendar_date_prefers_the_second_slash_segment() {
        assert_eq!(
            resolve_calendar_date("12/25", 12, 2025).as_deref(),
            Some("2025-12-25")
        );
    }

    #[test]
    fn resolve_calendar_date_falls_back_to_the_first_segment() {
        assert_eq!(
            resolve_calendar_date("7", 7, 2025).as_deref(),
            Some("2025-07-07")
        );
        assert_eq!(
            resolve_calendar_date("25/XX", 12, 2025).as_deref(),
            Some("2025-12-25")
        );
    }

    #[test]
    fn resolve_calendar_date_rejects_impossible_dates_and_bare_text() {
        assert_eq!(resolve_calendar_date("2/31", 2, 2025), None);
        assert_eq!(resolve_calendar_date("N/A", 12, 2025), None);
    }
}
