use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write preference file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path).await;
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_entries(path: &Path) -> BTreeMap<String, Value> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse preference file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read preference file: {err}");
            BTreeMap::new()
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        let payload = serde_json::to_vec_pretty(&updated)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, payload).await?;
        *entries = updated;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKind {
    Flag,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKey {
    JsInjector,
    JsText,
    CssInjector,
    CssText,
    DevtoolsVisible,
    HomeworkVisible,
}

impl PrefKey {
    pub const ALL: [PrefKey; 6] = [
        PrefKey::JsInjector,
        PrefKey::JsText,
        PrefKey::CssInjector,
        PrefKey::CssText,
        PrefKey::DevtoolsVisible,
        PrefKey::HomeworkVisible,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::JsInjector => "isCheckedJsInjector",
            PrefKey::JsText => "scriptJsTextValue",
            PrefKey::CssInjector => "isCheckedCssInjector",
            PrefKey::CssText => "scriptCssTextValue",
            PrefKey::DevtoolsVisible => "devtoolsVisible",
            PrefKey::HomeworkVisible => "homeworkVisible",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == value)
    }

    pub fn kind(self) -> PrefKind {
        match self {
            PrefKey::JsText | PrefKey::CssText => PrefKind::Text,
            _ => PrefKind::Flag,
        }
    }
}

pub fn decode_flag(stored: Option<&Value>) -> bool {
    match stored {
        Some(Value::Bool(value)) => *value,
        Some(other) => {
            warn!("ignoring non-boolean stored flag: {other}");
            false
        }
        None => false,
    }
}

pub fn decode_text(stored: Option<&Value>, default: &str) -> String {
    match stored {
        Some(Value::String(value)) => value.clone(),
        Some(other) => {
            warn!("ignoring non-string stored text: {other}");
            default.to_string()
        }
        None => default.to_string(),
    }
}

pub async fn load_flag(store: &dyn KeyValueStore, key: PrefKey) -> bool {
    decode_flag(store.get(key.as_str()).await.as_ref())
}

pub async fn load_text(store: &dyn KeyValueStore, key: PrefKey, default: &str) -> String {
    decode_text(store.get(key.as_str()).await.as_ref(), default)
}

pub async fn save_flag(store: &dyn KeyValueStore, key: PrefKey, value: bool) -> Result<(), StoreError> {
    store.set(key.as_str(), Value::Bool(value)).await
}

pub async fn save_text(store: &dyn KeyValueStore, key: PrefKey, value: &str) -> Result<(), StoreError> {
    store.set(key.as_str(), Value::String(value.to_string())).await
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    #[serde(rename = "isCheckedJsInjector")]
    pub js_injector: bool,
    #[serde(rename = "scriptJsTextValue")]
    pub js_text: String,
    #[serde(rename = "isCheckedCssInjector")]
    pub css_injector: bool,
    #[serde(rename = "scriptCssTextValue")]
    pub css_text: String,
    #[serde(rename = "devtoolsVisible")]
    pub devtools_visible: bool,
    #[serde(rename = "homeworkVisible")]
    pub homework_visible: bool,
}

impl Preferences {
    pub async fn reload(&mut self, store: &dyn KeyValueStore) {
        self.js_injector = load_flag(store, PrefKey::JsInjector).await;
        self.js_text = load_text(store, PrefKey::JsText, &self.js_text).await;
        self.css_injector = load_flag(store, PrefKey::CssInjector).await;
        self.css_text = load_text(store, PrefKey::CssText, &self.css_text).await;
        self.devtools_visible = load_flag(store, PrefKey::DevtoolsVisible).await;
        self.homework_visible = load_flag(store, PrefKey::HomeworkVisible).await;
    }

    pub async fn load(store: &dyn KeyValueStore) -> Self {
        let mut prefs = Self::default();
        prefs.reload(store).await;
        prefs
    }

    pub fn flag(&self, key: PrefKey) -> Option<bool> {
        match key {
            PrefKey::JsInjector => Some(self.js_injector),
            PrefKey::CssInjector => Some(self.css_injector),
            PrefKey::DevtoolsVisible => Some(self.devtools_visible),
            PrefKey::HomeworkVisible => Some(self.homework_visible),
            PrefKey::JsText | PrefKey::CssText => None,
        }
    }

    pub fn flag_mut(&mut self, key: PrefKey) -> Option<&mut bool> {
        match key {
            PrefKey::JsInjector => Some(&mut self.js_injector),
            PrefKey::CssInjector => Some(&mut self.css_injector),
            PrefKey::DevtoolsVisible => Some(&mut self.devtools_visible),
            PrefKey::HomeworkVisible => Some(&mut self.homework_visible),
            PrefKey::JsText | PrefKey::CssText => None,
        }
    }

    pub fn text_mut(&mut self, key: PrefKey) -> Option<&mut String> {
        match key {
            PrefKey::JsText => Some(&mut self.js_text),
            PrefKey::CssText => Some(&mut self.css_text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn flag_round_trip() {
        let store = MemoryStore::new();
        save_flag(&store, PrefKey::JsInjector, true).await.unwrap();
        assert!(load_flag(&store, PrefKey::JsInjector).await);
    }

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let store = MemoryStore::new();
        for key in PrefKey::ALL {
            if key.kind() == PrefKind::Flag {
                assert!(!load_flag(&store, key).await, "{} should default off", key.as_str());
            } else {
                assert_eq!(load_text(&store, key, "keep me").await, "keep me");
            }
        }
    }

    #[test]
    fn string_false_is_not_truthy() {
        assert!(!decode_flag(Some(&json!("false"))));
        assert!(!decode_flag(Some(&json!("true"))));
        assert!(!decode_flag(Some(&json!(1))));
        assert!(decode_flag(Some(&json!(true))));
    }

    #[test]
    fn non_string_text_keeps_default() {
        assert_eq!(decode_text(Some(&json!(42)), "body {}"), "body {}");
        assert_eq!(decode_text(Some(&json!("")), "body {}"), "");
    }

    #[test]
    fn keys_round_trip_through_names() {
        for key in PrefKey::ALL {
            assert_eq!(PrefKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(PrefKey::parse("unknown"), None);
        assert_eq!(PrefKey::CssText.kind(), PrefKind::Text);
        assert_eq!(PrefKey::HomeworkVisible.kind(), PrefKind::Flag);
    }

    #[tokio::test]
    async fn preferences_load_from_seeded_store() {
        let store = MemoryStore::with_entries([
            ("isCheckedCssInjector".to_string(), json!(true)),
            ("scriptCssTextValue".to_string(), json!("body { color: red; }")),
            ("homeworkVisible".to_string(), json!("yes")),
        ]);
        let prefs = Preferences::load(&store).await;
        assert!(prefs.css_injector);
        assert_eq!(prefs.css_text, "body { color: red; }");
        assert!(!prefs.homework_visible);
        assert!(!prefs.js_injector);
        assert_eq!(prefs.js_text, "");
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = JsonFileStore::open(&path).await;
        save_flag(&store, PrefKey::DevtoolsVisible, true).await.unwrap();
        save_text(&store, PrefKey::JsText, "console.log(1)").await.unwrap();

        let reopened = JsonFileStore::open(&path).await;
        assert!(load_flag(&reopened, PrefKey::DevtoolsVisible).await);
        assert_eq!(load_text(&reopened, PrefKey::JsText, "").await, "console.log(1)");
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let store = JsonFileStore::open(blocker.join("prefs.json")).await;
        assert!(save_flag(&store, PrefKey::JsInjector, true).await.is_err());
        assert_eq!(store.get("isCheckedJsInjector").await, None);
    }

    #[tokio::test]
    async fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = JsonFileStore::open(&path).await;
        assert_eq!(store.get("devtoolsVisible").await, None);
    }
}
