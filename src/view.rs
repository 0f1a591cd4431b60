use crate::clock::{Clock, format_clock};
use crate::feeds::{FeedClient, FeedError};
use crate::homework::{group_runs, sort_by_date};
use crate::injector::{InjectError, InjectionOutcome, TabHost, run_injection};
use crate::models::{CalendarEvent, HomeworkItem, HomeworkResponse, ScheduleResponse, WeekSchedule};
use crate::preferences::{KeyValueStore, PrefKey, Preferences, StoreError, save_flag, save_text};
use crate::schedule::match_for_today;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("{0} is not a boolean preference")]
    NotAFlag(&'static str),
    #[error("{0} is not a text preference")]
    NotText(&'static str),
}

#[derive(Debug)]
pub struct PrefWrite<T> {
    pub value: T,
    pub persisted: Result<(), StoreError>,
}

#[derive(Debug, Clone, Default)]
struct CalendarSlot {
    loading: bool,
    week: Option<WeekSchedule>,
    current: Option<CalendarEvent>,
    next: Option<CalendarEvent>,
}

#[derive(Debug, Clone, Default)]
struct HomeworkSlot {
    loading: bool,
    items: Option<Vec<HomeworkItem>>,
}

#[derive(Debug, Default)]
struct ViewState {
    calendar: CalendarSlot,
    homework: HomeworkSlot,
    prefs: Preferences,
}

#[derive(Debug, Clone)]
pub struct PopupSnapshot {
    pub clock: String,
    pub schedule: ScheduleResponse,
    pub homework: HomeworkResponse,
    pub prefs: Preferences,
}

pub struct PopupView {
    feeds: FeedClient,
    store: Arc<dyn KeyValueStore>,
    tabs: Arc<dyn TabHost>,
    now: watch::Receiver<NaiveDateTime>,
    clock: Mutex<Clock>,
    state: Mutex<ViewState>,
}

impl PopupView {
    pub async fn new(
        feeds: FeedClient,
        store: Arc<dyn KeyValueStore>,
        tabs: Arc<dyn TabHost>,
        clock: Clock,
    ) -> Self {
        let prefs = Preferences::load(store.as_ref()).await;
        let state = ViewState {
            calendar: CalendarSlot {
                loading: true,
                ..CalendarSlot::default()
            },
            homework: HomeworkSlot {
                loading: true,
                ..HomeworkSlot::default()
            },
            prefs,
        };

        Self {
            feeds,
            store,
            tabs,
            now: clock.subscribe(),
            clock: Mutex::new(clock),
            state: Mutex::new(state),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        *self.now.borrow()
    }

    pub fn clock_display(&self) -> String {
        format_clock(self.now().time())
    }

    pub async fn shutdown(&self) {
        self.clock.lock().await.stop();
    }

    pub async fn refresh_calendar(&self) {
        let result = self.feeds.calendar().await;
        self.apply_calendar(result, self.now()).await;
    }

    pub async fn refresh_calendar_at(&self, now: NaiveDateTime) {
        let result = self.feeds.calendar().await;
        self.apply_calendar(result, now).await;
    }

    async fn apply_calendar(&self, result: Result<WeekSchedule, FeedError>, now: NaiveDateTime) {
        let mut state = self.state.lock().await;
        match result {
            Ok(week) => {
                let window = match_for_today(&week, now);
                state.calendar.current = window.current.cloned();
                state.calendar.next = window.next.cloned();
                state.calendar.week = Some(week);
            }
            Err(err) => error!("failed to fetch calendar: {err}"),
        }
        state.calendar.loading = false;
    }

    pub async fn refresh_homework(&self) {
        let result = self.feeds.homework().await;
        let mut state = self.state.lock().await;
        match result {
            Ok(items) => state.homework.items = Some(sort_by_date(items)),
            Err(err) => error!("failed to fetch homework: {err}"),
        }
        state.homework.loading = false;
    }

    pub async fn open(&self) {
        tokio::join!(
            self.refresh_calendar(),
            self.refresh_homework(),
            self.reload_preferences()
        );
    }

    // Holds the state lock for the whole reload so a concurrent toggle lands
    // after it instead of being overwritten by it.
    pub async fn reload_preferences(&self) {
        let mut state = self.state.lock().await;
        state.prefs.reload(self.store.as_ref()).await;
    }

    pub async fn schedule(&self) -> ScheduleResponse {
        let state = self.state.lock().await;
        ScheduleResponse {
            loading: state.calendar.loading,
            loaded: state.calendar.week.is_some(),
            current: state.calendar.current.clone(),
            next: state.calendar.next.clone(),
        }
    }

    pub async fn homework(&self) -> HomeworkResponse {
        let state = self.state.lock().await;
        HomeworkResponse {
            loading: state.homework.loading,
            loaded: state.homework.items.is_some(),
            groups: state
                .homework
                .items
                .as_deref()
                .map(group_runs)
                .unwrap_or_default(),
        }
    }

    pub async fn preferences(&self) -> Preferences {
        self.state.lock().await.prefs.clone()
    }

    pub async fn snapshot(&self) -> PopupSnapshot {
        PopupSnapshot {
            clock: self.clock_display(),
            schedule: self.schedule().await,
            homework: self.homework().await,
            prefs: self.preferences().await,
        }
    }

    pub async fn toggle(&self, key: PrefKey) -> Result<PrefWrite<bool>, PreferenceError> {
        let value = {
            let mut state = self.state.lock().await;
            let flag = state
                .prefs
                .flag_mut(key)
                .ok_or(PreferenceError::NotAFlag(key.as_str()))?;
            *flag = !*flag;
            *flag
        };

        let persisted = save_flag(self.store.as_ref(), key, value).await;
        if let Err(err) = &persisted {
            warn!(key = key.as_str(), "failed to persist preference: {err}");
        }
        Ok(PrefWrite { value, persisted })
    }

    pub async fn set_text(&self, key: PrefKey, value: String) -> Result<PrefWrite<String>, PreferenceError> {
        {
            let mut state = self.state.lock().await;
            let text = state
                .prefs
                .text_mut(key)
                .ok_or(PreferenceError::NotText(key.as_str()))?;
            text.clone_from(&value);
        }

        let persisted = save_text(self.store.as_ref(), key, &value).await;
        if let Err(err) = &persisted {
            warn!(key = key.as_str(), "failed to persist preference: {err}");
        }
        Ok(PrefWrite { value, persisted })
    }

    pub async fn run_injection(&self) -> Result<InjectionOutcome, InjectError> {
        let prefs = self.preferences().await;
        run_injection(self.tabs.as_ref(), &prefs).await
    }

    pub fn spawn_injection(self: &Arc<Self>) {
        let view = Arc::clone(self);
        tokio::spawn(async move {
            match view.run_injection().await {
                Ok(outcome) => info!(?outcome, "injection finished"),
                Err(err) => warn!("injection failed: {err}"),
            }
        });
    }
}
