use crate::models::{DateGroup, HomeworkItem};
use chrono::NaiveDate;

// DD/MM/YY, two-digit years in the 2000s.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let mut parts = value.trim().split('/');
    let day = parts.next()?.trim().parse::<u32>().ok()?;
    let month = parts.next()?.trim().parse::<u32>().ok()?;
    let year = parts.next()?.trim().parse::<i32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

// Stable; unreadable dates go last.
pub fn sort_by_date(mut items: Vec<HomeworkItem>) -> Vec<HomeworkItem> {
    items.sort_by_cached_key(|item| {
        let date = parse_due_date(&item.date);
        (date.is_none(), date)
    });
    items
}

pub fn group_runs(items: &[HomeworkItem]) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for item in items {
        match groups.last_mut() {
            Some(group) if group.date == item.date => group.items.push(item.clone()),
            _ => groups.push(DateGroup {
                date: item.date.clone(),
                items: vec![item.clone()],
            }),
        }
    }
    groups
}
