use crate::models::CalendarEvent;
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};
use tracing::debug;

// Indexed by days from Sunday; Sunday has no schedule.
const DAY_INDEX: [Option<usize>; 7] = [None, Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventWindow<'a> {
    pub current: Option<&'a CalendarEvent>,
    pub next: Option<&'a CalendarEvent>,
}

pub fn schedule_index(weekday: Weekday) -> Option<usize> {
    DAY_INDEX[weekday.num_days_from_sunday() as usize]
}

pub fn events_for_day(week: &[Vec<CalendarEvent>], weekday: Weekday) -> &[CalendarEvent] {
    schedule_index(weekday)
        .and_then(|index| week.get(index))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

// "24:00" is the end of the day.
pub fn parse_time_of_day(value: &str) -> Option<Duration> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours = hours.trim().parse::<i64>().ok()?;
    let minutes = minutes.trim().parse::<i64>().ok()?;
    let valid = ((0..24).contains(&hours) && (0..60).contains(&minutes)) || (hours, minutes) == (24, 0);
    valid.then(|| Duration::minutes(hours * 60 + minutes))
}

// Events run over [from, to). On overlap the last match wins.
pub fn match_current_and_next(events: &[CalendarEvent], now: NaiveDateTime) -> EventWindow<'_> {
    let midnight = now.date().and_time(NaiveTime::default());
    let mut matched = None;

    for (index, event) in events.iter().enumerate() {
        let (Some(from), Some(to)) = (parse_time_of_day(&event.from), parse_time_of_day(&event.to))
        else {
            debug!(subject = %event.subject, from = %event.from, to = %event.to, "skipping event with unparseable times");
            continue;
        };

        let start = midnight + from;
        let end = midnight + to;
        if start <= now && now < end {
            matched = Some(index);
        }
    }

    match matched {
        Some(index) => EventWindow {
            current: events.get(index),
            next: events.get(index + 1),
        },
        None => EventWindow::default(),
    }
}

pub fn match_for_today(week: &[Vec<CalendarEvent>], now: NaiveDateTime) -> EventWindow<'_> {
    match_current_and_next(events_for_day(week, now.weekday()), now)
}
