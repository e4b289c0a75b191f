use crate::packet::leg::{FlightLeg, extract_flight_leg};
use crate::packet::lines::{LineClassifier, LineKind};

#[derive(Debug, Clone, Default)]
pub struct SequenceDutyDay {
    pub report_line: Option<String>,
    pub report_time: Option<String>,
    pub release_line: Option<String>,
    pub release_time: Option<String>,
    pub calendar_day: Option<String>,
    pub legs: Vec<FlightLeg>,
    pub hotel_layover: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Default)]
pub enum GrouperState {
    #[default]
    NoOpenDay,
    DayOpen {
        day_number: Option<String>,
        day: SequenceDutyDay,
    },
}

pub fn group_duty_days(classifier: &LineClassifier, lines: &[String]) -> Vec<SequenceDutyDay> {
    let mut days = Vec::new();
    let mut state = GrouperState::NoOpenDay;

    for line in lines {
        let (next_state, emitted) = step(state, classifier, line);
        if let Some(day) = emitted {
            days.push(day);
        }
        state = next_state;
    }

    if let GrouperState::DayOpen { day, .. } = state {
        days.push(day);
    }

    days
}

// Flush points are exactly the two events that signal a new duty period: a
// second report line, or a leg whose day-number disagrees with the
// established one. Everything else attaches to the open day.
pub fn step(
    state: GrouperState,
    classifier: &LineClassifier,
    line: &str,
) -> (GrouperState, Option<SequenceDutyDay>) {
    match classifier.classify(line) {
        LineKind::Report => on_report(state, line),
        LineKind::FlightLeg => on_flight_leg(state, line),
        LineKind::Release => on_release(state, line),
        LineKind::Hotel => on_hotel(state, line),
        LineKind::SequenceStart | LineKind::Totals | LineKind::Other => on_other(state, line),
    }
}

fn on_report(state: GrouperState, line: &str) -> (GrouperState, Option<SequenceDutyDay>) {
    match state {
        GrouperState::NoOpenDay => (open_with_report(line), None),
        GrouperState::DayOpen { day_number, mut day } => {
            if day.report_line.is_some() {
                (open_with_report(line), Some(day))
            } else {
                attach_report(&mut day, line);
                (GrouperState::DayOpen { day_number, day }, None)
            }
        }
    }
}

fn on_flight_leg(state: GrouperState, line: &str) -> (GrouperState, Option<SequenceDutyDay>) {
    let leg = extract_flight_leg(line);
    let leg_day = leg.day.clone();

    match state {
        GrouperState::NoOpenDay => {
            let mut day = SequenceDutyDay::default();
            append_leg(&mut day, leg);
            (
                GrouperState::DayOpen {
                    day_number: leg_day,
                    day,
                },
                None,
            )
        }
        GrouperState::DayOpen { day_number, mut day } => {
            let day_changed = matches!(
                (&day_number, &leg_day),
                (Some(current), Some(next)) if current != next
            );

            if day_changed {
                let mut fresh = SequenceDutyDay::default();
                append_leg(&mut fresh, leg);
                (
                    GrouperState::DayOpen {
                        day_number: leg_day,
                        day: fresh,
                    },
                    Some(day),
                )
            } else {
                let day_number = day_number.or(leg_day);
                append_leg(&mut day, leg);
                (GrouperState::DayOpen { day_number, day }, None)
            }
        }
    }
}

fn on_release(state: GrouperState, line: &str) -> (GrouperState, Option<SequenceDutyDay>) {
    let (day_number, mut day) = open_or_reuse(state);
    day.release_line = Some(line.to_string());
    day.release_time = second_token(line);
    (GrouperState::DayOpen { day_number, day }, None)
}

fn on_hotel(state: GrouperState, line: &str) -> (GrouperState, Option<SequenceDutyDay>) {
    let (day_number, mut day) = open_or_reuse(state);
    day.hotel_layover = Some(line.to_string());
    (GrouperState::DayOpen { day_number, day }, None)
}

fn on_other(state: GrouperState, line: &str) -> (GrouperState, Option<SequenceDutyDay>) {
    match state {
        GrouperState::NoOpenDay => (GrouperState::NoOpenDay, None),
        GrouperState::DayOpen { day_number, mut day } => {
            day.summary = Some(match day.summary.take() {
                Some(existing) => format!("{existing} | {line}"),
                None => line.to_string(),
            });
            (GrouperState::DayOpen { day_number, day }, None)
        }
    }
}

fn open_with_report(line: &str) -> GrouperState {
    let mut day = SequenceDutyDay::default();
    attach_report(&mut day, line);
    GrouperState::DayOpen {
        day_number: None,
        day,
    }
}

fn open_or_reuse(state: GrouperState) -> (Option<String>, SequenceDutyDay) {
    match state {
        GrouperState::NoOpenDay => (None, SequenceDutyDay::default()),
        GrouperState::DayOpen { day_number, day } => (day_number, day),
    }
}

fn attach_report(day: &mut SequenceDutyDay, line: &str) {
    day.report_line = Some(line.to_string());
    day.report_time = second_token(line);
}

fn append_leg(day: &mut SequenceDutyDay, leg: FlightLeg) {
    if day.calendar_day.is_none() {
        day.calendar_day = leg.date.clone();
    }
    day.legs.push(leg);
}

fn second_token(line: &str) -> Option<String> {
    line.split_whitespace().nth(1).map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::group_duty_days;
    use crate::packet::lines::LineClassifier;

    fn group(lines: &[&str]) -> Vec<super::SequenceDutyDay> {
        let classifier = LineClassifier::new().expect("classifier regexes should compile");
        let owned: Vec<String> = lines.iter().map(|line| (*line).to_string()).collect();
        group_duty_days(&classifier, &owned)
    }

    #[test]
    fn groups_report_leg_and_release_into_a_single_day() {
        let days = group(&[
            "RPT 0600",
            "1 12/25 737 1234 BOS 0700 E LGA 0815 1.15",
            "RLS 0900",
        ]);

        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.report_time.as_deref(), Some("0600"));
        assert_eq!(day.release_time.as_deref(), Some("0900"));
        assert_eq!(day.calendar_day.as_deref(), Some("12/25"));
        assert_eq!(day.legs.len(), 1);
        assert_eq!(day.legs[0].meal.as_deref(), Some("E"));
        assert_eq!(day.legs[0].block_time.as_deref(), Some("1.15"));
    }

    #[test]
    fn second_report_flushes_the_open_day() {
        let days = group(&[
            "RPT 0600",
            "1 12/25 737 1234 BOS 0700 LGA 0815 1.15",
            "RPT 1400",
            "2 12/26 737 1250 LGA 1500 BOS 1615 1.15",
        ]);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].report_time.as_deref(), Some("0600"));
        assert_eq!(days[1].report_time.as_deref(), Some("1400"));
        assert_eq!(days[0].legs.len(), 1);
        assert_eq!(days[1].legs.len(), 1);
    }

    #[test]
    fn day_number_change_flushes_even_without_a_report() {
        let days = group(&[
            "1 12/25 737 1234 BOS 0700 LGA 0815 1.15",
            "1 12/25 737 1236 LGA 0900 ORD 1030 2.30",
            "2 12/26 320 987 ORD 0800 BOS 1015 2.15",
        ]);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].legs.len(), 2);
        assert_eq!(days[1].legs.len(), 1);
        assert_eq!(days[1].calendar_day.as_deref(), Some("12/26"));
    }

    #[test]
    fn late_report_attaches_to_a_day_opened_by_legs() {
        let days = group(&[
            "1 12/25 737 1234 BOS 0700 LGA 0815 1.15",
            "RPT 0600",
            "RLS 0900",
        ]);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].report_time.as_deref(), Some("0600"));
        assert_eq!(days[0].release_time.as_deref(), Some("0900"));
    }

    #[test]
    fn release_and_hotel_open_a_day_when_none_is_open() {
        let days = group(&["RLS 1730/1715", "LAX MARRIOTT HOTEL 15.45"]);

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].release_time.as_deref(), Some("1730/1715"));
        assert_eq!(
            days[0].hotel_layover.as_deref(),
            Some("LAX MARRIOTT HOTEL 15.45")
        );
    }

    #[test]
    fn unclassified_lines_join_the_open_day_summary() {
        let days = group(&[
            "RPT 0600",
            "CREW MUST CLEAR CUSTOMS",
            "SEE NOTES PAGE",
            "RLS 0900",
        ]);

        assert_eq!(days.len(), 1);
        assert_eq!(
            days[0].summary.as_deref(),
            Some("CREW MUST CLEAR CUSTOMS | SEE NOTES PAGE")
        );
    }

    #[test]
    fn unclassified_lines_before_any_day_are_dropped() {
        let days = group(&["STANDALONE NOTE", "RPT 0600", "RLS 0900"]);

        assert_eq!(days.len(), 1);
        assert!(days[0].summary.is_none());
    }
}
