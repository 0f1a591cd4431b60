use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(rename = "uf")]
    pub subject: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub room: String,
}

// Monday first.
pub type WeekSchedule = Vec<Vec<CalendarEvent>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkItem {
    #[serde(rename = "uf")]
    pub subject: String,
    pub date: String,
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateGroup {
    pub date: String,
    pub items: Vec<HomeworkItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub loading: bool,
    pub loaded: bool,
    pub current: Option<CalendarEvent>,
    pub next: Option<CalendarEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeworkResponse {
    pub loading: bool,
    pub loaded: bool,
    pub groups: Vec<DateGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockResponse {
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreferenceUpdateResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub persisted: bool,
}
