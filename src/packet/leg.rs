#[derive(Debug, Clone, Default)]
pub struct FlightLeg {
    pub raw: String,
    pub day: Option<String>,
    pub date: Option<String>,
    pub equipment: Option<String>,
    pub flight_number: Option<String>,
    pub departure_station: Option<String>,
    pub departure_time: Option<String>,
    pub meal: Option<String>,
    pub arrival_station: Option<String>,
    pub arrival_time: Option<String>,
    pub block_time: Option<String>,
    pub remarks: Option<String>,
}

pub fn extract_flight_leg(line: &str) -> FlightLeg {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut cursor = 0_usize;

    let mut leg = FlightLeg {
        raw: line.to_string(),
        ..FlightLeg::default()
    };

    leg.day = take_token(&tokens, &mut cursor);
    leg.date = take_token(&tokens, &mut cursor);
    leg.equipment = take_token(&tokens, &mut cursor);
    leg.flight_number = take_token(&tokens, &mut cursor);
    leg.departure_station = take_token(&tokens, &mut cursor);
    leg.departure_time = take_token(&tokens, &mut cursor);

    // A single uppercase letter in this slot is always a meal code, never a
    // station or a time.
    if next_is_meal_code(&tokens, cursor) {
        leg.meal = take_token(&tokens, &mut cursor);
    }

    leg.arrival_station = take_token(&tokens, &mut cursor);
    leg.arrival_time = take_token(&tokens, &mut cursor);

    if next_is_block_time(&tokens, cursor) {
        leg.block_time = take_token(&tokens, &mut cursor);
    }

    if cursor < tokens.len() {
        leg.remarks = Some(tokens[cursor..].join(" "));
    }

    leg
}

fn take_token(tokens: &[&str], cursor: &mut usize) -> Option<String> {
    let token = tokens.get(*cursor)?;
    *cursor += 1;
    Some((*token).to_string())
}

fn next_is_meal_code(tokens: &[&str], cursor: usize) -> bool {
    tokens
        .get(cursor)
        .is_some_and(|token| token.len() == 1 && token.chars().all(|c| c.is_ascii_uppercase()))
}

fn next_is_block_time(tokens: &[&str], cursor: usize) -> bool {
    tokens
        .get(cursor)
        .is_some_and(|token| token.chars().next().is_some_and(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::extract_flight_leg;

    #[test]
    fn extracts_all_fields_from_a_complete_leg_line() {
        let leg = extract_flight_leg("1 12/25 737 1234 BOS 0700 E LGA 0815 1.15");

        assert_eq!(leg.day.as_deref(), Some("1"));
        assert_eq!(leg.date.as_deref(), Some("12/25"));
        assert_eq!(leg.equipment.as_deref(), Some("737"));
        assert_eq!(leg.flight_number.as_deref(), Some("1234"));
        assert_eq!(leg.departure_station.as_deref(), Some("BOS"));
        assert_eq!(leg.departure_time.as_deref(), Some("0700"));
        assert_eq!(leg.meal.as_deref(), Some("E"));
        assert_eq!(leg.arrival_station.as_deref(), Some("LGA"));
        assert_eq!(leg.arrival_time.as_deref(), Some("0815"));
        assert_eq!(leg.block_time.as_deref(), Some("1.15"));
        assert!(leg.remarks.is_none());
    }

    #[test]
    fn skips_meal_slot_when_no_single_letter_token_follows_departure() {
        let leg = extract_flight_leg("2 12/26 320 987 LGA 0900 ORD 1045 2.45");

        assert!(leg.meal.is_none());
        assert_eq!(leg.arrival_station.as_deref(), Some("ORD"));
        assert_eq!(leg.arrival_time.as_deref(), Some("1045"));
        assert_eq!(leg.block_time.as_deref(), Some("2.45"));
    }

    #[test]
    fn collects_leftover_tokens_into_remarks() {
        let leg = extract_flight_leg("1 12/25 737 1234 BOS 0700 LGA 0815 1.15 DH CREW MEAL");

        assert_eq!(leg.block_time.as_deref(), Some("1.15"));
        assert_eq!(leg.remarks.as_deref(), Some("DH CREW MEAL"));
    }

    #[test]
    fn short_lines_fill_only_the_leading_slots() {
        let leg = extract_flight_leg("3 12/27");

        assert_eq!(leg.day.as_deref(), Some("3"));
        assert_eq!(leg.date.as_deref(), Some("12/27"));
        assert!(leg.equipment.is_none());
        assert!(leg.flight_number.is_none());
        assert!(leg.block_time.is_none());
        assert!(leg.remarks.is_none());
    }

    #[test]
    fn block_time_requires_a_leading_digit() {
        let leg = extract_flight_leg("1 12/25 737 1234 BOS 0700 LGA 0815 DEADHEAD");

        assert!(leg.block_time.is_none());
        assert_eq!(leg.remarks.as_deref(), Some("DEADHEAD"));
    }
}
