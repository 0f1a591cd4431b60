use crate::preferences::Preferences;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

const STYLE_MARKER: &str = "data-dam-tools";

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("tab discovery failed: {0}")]
    Discovery(#[from] reqwest::Error),
    #[error("tab {0} exposes no debugger socket")]
    NoDebugger(String),
    #[error("debugger socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed debugger reply: {0}")]
    Reply(#[from] serde_json::Error),
    #[error("debugger rejected the call: {0}")]
    Protocol(String),
    #[error("page threw: {0}")]
    Exception(String),
    #[error("debugger socket closed before replying")]
    Closed,
    #[error("debugger did not answer within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabTarget {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub debugger_url: Option<String>,
}

#[async_trait]
pub trait TabHost: Send + Sync {
    async fn active_tab(&self) -> Result<Option<TabTarget>, InjectError>;
    async fn execute_script(&self, tab: &TabTarget, script: &str) -> Result<(), InjectError>;
    async fn insert_css(&self, tab: &TabTarget, css: &str) -> Result<(), InjectError>;
    async fn remove_css(&self, tab: &TabTarget, css: &str) -> Result<(), InjectError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleAction {
    Inserted,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionOutcome {
    NoActiveTab,
    Applied { script_ran: bool, style: StyleAction },
}

// A failing script does not stop the style step; the first error is returned.
pub async fn run_injection(host: &dyn TabHost, prefs: &Preferences) -> Result<InjectionOutcome, InjectError> {
    let Some(tab) = host.active_tab().await? else {
        info!("no active tab to inject into");
        return Ok(InjectionOutcome::NoActiveTab);
    };
    debug!(tab = %tab.id, url = %tab.url, "injecting into active tab");

    let script = if prefs.js_injector {
        Some(host.execute_script(&tab, &prefs.js_text).await)
    } else {
        None
    };
    if let Some(Err(err)) = &script {
        warn!("script injection failed: {err}");
    }

    let (style, action) = if prefs.css_injector {
        (host.insert_css(&tab, &prefs.css_text).await, StyleAction::Inserted)
    } else {
        (host.remove_css(&tab, &prefs.css_text).await, StyleAction::Removed)
    };

    script.transpose()?;
    style?;
    Ok(InjectionOutcome::Applied {
        script_ran: prefs.js_injector,
        style: action,
    })
}

#[derive(Debug, Clone)]
pub struct DevToolsHost {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl DevToolsHost {
    pub fn new(http: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, InjectError>>) -> Result<T, InjectError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| InjectError::Timeout(self.timeout))?
    }

    async fn list_targets(&self) -> Result<Vec<TabTarget>, InjectError> {
        Ok(self
            .http
            .get(format!("{}/json/list", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    async fn evaluate(&self, tab: &TabTarget, expression: &str) -> Result<(), InjectError> {
        self.bounded(self.exchange(tab, expression)).await
    }

    async fn exchange(&self, tab: &TabTarget, expression: &str) -> Result<(), InjectError> {
        let socket_url = tab
            .debugger_url
            .as_deref()
            .ok_or_else(|| InjectError::NoDebugger(tab.id.clone()))?;
        let (mut socket, _) = connect_async(socket_url).await?;

        let request = json!({
            "id": 1,
            "method": "Runtime.evaluate",
            "params": {
                "expression": expression,
                "awaitPromise": true,
                "userGesture": true,
            },
        });
        socket.send(Message::Text(request.to_string())).await?;

        while let Some(message) = socket.next().await {
            let Message::Text(text) = message? else {
                continue;
            };
            let reply: Value = serde_json::from_str(&text)?;
            // Anything without our id is an unsolicited event.
            if reply.get("id").and_then(Value::as_u64) != Some(1) {
                continue;
            }
            let _ = socket.close(None).await;

            if let Some(error) = reply.get("error") {
                let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown error");
                return Err(InjectError::Protocol(message.to_string()));
            }
            if let Some(details) = reply.pointer("/result/exceptionDetails") {
                let text = details
                    .pointer("/exception/description")
                    .or_else(|| details.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or("uncaught exception");
                return Err(InjectError::Exception(text.to_string()));
            }
            return Ok(());
        }

        Err(InjectError::Closed)
    }
}

#[async_trait]
impl TabHost for DevToolsHost {
    // Chromium lists targets most recently focused first.
    async fn active_tab(&self) -> Result<Option<TabTarget>, InjectError> {
        let targets = self.bounded(self.list_targets()).await?;
        Ok(targets
            .into_iter()
            .find(|target| target.kind == "page" && target.debugger_url.is_some()))
    }

    async fn execute_script(&self, tab: &TabTarget, script: &str) -> Result<(), InjectError> {
        self.evaluate(tab, script).await
    }

    async fn insert_css(&self, tab: &TabTarget, css: &str) -> Result<(), InjectError> {
        self.evaluate(tab, &insert_style_expression(css)).await
    }

    async fn remove_css(&self, tab: &TabTarget, css: &str) -> Result<(), InjectError> {
        self.evaluate(tab, &remove_style_expression(css)).await
    }
}

fn insert_style_expression(css: &str) -> String {
    format!(
        "(() => {{ const style = document.createElement('style'); \
         style.setAttribute('{STYLE_MARKER}', ''); \
         style.textContent = {css}; \
         (document.head || document.documentElement).appendChild(style); }})()",
        css = Value::String(css.to_string()),
    )
}

fn remove_style_expression(css: &str) -> String {
    format!(
        "document.querySelectorAll('style[{STYLE_MARKER}]').forEach((style) => {{ \
         if (style.textContent === {css}) style.remove(); }})",
        css = Value::String(css.to_string()),
    )
}
