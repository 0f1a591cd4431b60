use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use dam_tools::clock::Clock;
use dam_tools::feeds::{FeedClient, FeedError};
use dam_tools::injector::{InjectError, TabHost, TabTarget};
use dam_tools::preferences::MemoryStore;
use dam_tools::PopupView;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoBrowser;

#[async_trait]
impl TabHost for NoBrowser {
    async fn active_tab(&self) -> Result<Option<TabTarget>, InjectError> {
        Ok(None)
    }

    async fn execute_script(&self, _tab: &TabTarget, _script: &str) -> Result<(), InjectError> {
        Ok(())
    }

    async fn insert_css(&self, _tab: &TabTarget, _css: &str) -> Result<(), InjectError> {
        Ok(())
    }

    async fn remove_css(&self, _tab: &TabTarget, _css: &str) -> Result<(), InjectError> {
        Ok(())
    }
}

fn day(date: (i32, u32, u32), hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

// 2025-09-02 is a Tuesday, 2025-09-07 a Sunday.
const TUESDAY: (i32, u32, u32) = (2025, 9, 2);
const SUNDAY: (i32, u32, u32) = (2025, 9, 7);

fn week() -> serde_json::Value {
    let tuesday = json!([
        {"uf": "M06", "from": "08:00", "to": "09:00", "teacher": "Anna", "room": "A1"},
        {"uf": "M09", "from": "09:00", "to": "10:00", "teacher": "Pere", "room": "A2"},
        {"uf": "M03", "from": "10:30", "to": "11:30", "teacher": "Laia", "room": "A3"}
    ]);
    json!([[], tuesday, [], [], [], [], []])
}

async fn feed_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/drive/calendar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(week()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/drive/homework"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uf": "M06", "date": "05/09/25", "head": "Pràctica 2", "body": "Entrega al Moodle"},
            {"uf": "M03", "date": "01/09/25", "head": "Exercicis 1", "body": "Pàgina 12"},
            {"uf": "M09", "date": "01/09/25", "head": "Exercicis 2", "body": "Pàgina 13"}
        ])))
        .mount(&server)
        .await;
    server
}

async fn view_for(server: &MockServer, at: NaiveDateTime) -> PopupView {
    let feeds = FeedClient::new(format!("{}/drive", server.uri()), Duration::from_secs(2)).unwrap();
    PopupView::new(feeds, Arc::new(MemoryStore::new()), Arc::new(NoBrowser), Clock::fixed(at)).await
}

#[tokio::test]
async fn feed_client_decodes_both_feeds() {
    let server = feed_server().await;
    let feeds = FeedClient::new(format!("{}/drive/", server.uri()), Duration::from_secs(2)).unwrap();

    let week = feeds.calendar().await.unwrap();
    assert_eq!(week.len(), 7);
    assert_eq!(week[1][0].subject, "M06");
    assert_eq!(week[1][0].teacher, "Anna");

    let homework = feeds.homework().await.unwrap();
    assert_eq!(homework.len(), 3);
    assert_eq!(homework[0].head, "Pràctica 2");
}

#[tokio::test]
async fn calendar_refresh_derives_current_and_next() {
    let server = feed_server().await;
    let view = view_for(&server, day(TUESDAY, 9, 15)).await;

    view.refresh_calendar().await;
    let schedule = view.schedule().await;
    assert!(!schedule.loading);
    assert!(schedule.loaded);
    assert_eq!(schedule.current.unwrap().subject, "M09");
    assert_eq!(schedule.next.unwrap().subject, "M03");
}

#[tokio::test]
async fn loaded_but_between_classes_has_no_match() {
    let server = feed_server().await;
    let view = view_for(&server, day(TUESDAY, 10, 10)).await;

    view.refresh_calendar().await;
    let schedule = view.schedule().await;
    assert!(schedule.loaded);
    assert!(schedule.current.is_none());
    assert!(schedule.next.is_none());
}

#[tokio::test]
async fn sunday_has_no_events() {
    let server = feed_server().await;
    let view = view_for(&server, day(SUNDAY, 9, 15)).await;

    view.refresh_calendar().await;
    let schedule = view.schedule().await;
    assert!(!schedule.loading);
    assert!(schedule.loaded);
    assert!(schedule.current.is_none());
}

#[tokio::test]
async fn homework_refresh_sorts_and_groups() {
    let server = feed_server().await;
    let view = view_for(&server, day(TUESDAY, 9, 15)).await;

    view.refresh_homework().await;
    let homework = view.homework().await;
    assert!(!homework.loading);
    let shape: Vec<(&str, Vec<&str>)> = homework
        .groups
        .iter()
        .map(|group| {
            (
                group.date.as_str(),
                group.items.iter().map(|item| item.head.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            ("01/09/25", vec!["Exercicis 1", "Exercicis 2"]),
            ("05/09/25", vec!["Pràctica 2"]),
        ]
    );
}

#[tokio::test]
async fn failed_refresh_keeps_last_good_state() {
    let server = feed_server().await;
    let view = view_for(&server, day(TUESDAY, 8, 30)).await;
    view.refresh_calendar_at(day(TUESDAY, 8, 30)).await;
    assert_eq!(view.schedule().await.current.unwrap().subject, "M06");

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/drive/calendar"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    view.refresh_calendar_at(day(TUESDAY, 9, 30)).await;
    let schedule = view.schedule().await;
    assert!(!schedule.loading);
    assert_eq!(schedule.current.unwrap().subject, "M06");
}

#[tokio::test]
async fn non_json_feed_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/homework"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let feeds = FeedClient::new(server.uri(), Duration::from_secs(2)).unwrap();
    assert!(matches!(feeds.homework().await, Err(FeedError::Decode { .. })));
    assert!(matches!(feeds.calendar().await, Err(FeedError::Status { status: 404, .. })));
}
