use chrono::{Local, NaiveDateTime, NaiveTime, Timelike};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

pub struct Clock {
    now: watch::Receiver<NaiveDateTime>,
    ticker: Option<JoinHandle<()>>,
}

impl Clock {
    pub fn start() -> Self {
        let (tx, rx) = watch::channel(Local::now().naive_local());
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            loop {
                interval.tick().await;
                if tx.send(Local::now().naive_local()).is_err() {
                    break;
                }
            }
        });

        Self {
            now: rx,
            ticker: Some(ticker),
        }
    }

    pub fn fixed(at: NaiveDateTime) -> Self {
        let (_tx, rx) = watch::channel(at);
        Self {
            now: rx,
            ticker: None,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        *self.now.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NaiveDateTime> {
        self.now.clone()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|ticker| !ticker.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            debug!("stopping clock ticker");
            ticker.abort();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

pub fn format_clock(time: NaiveTime) -> String {
    format!("{:02}:{:02}:{:02}", time.hour(), time.minute(), time.second())
}
