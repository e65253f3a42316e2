//! Reactive in-memory cache of the pattern collection.
//!
//! [`PatternStore`] owns the session state the UI layer observes: the full
//! cached pattern list, the active language filter, the current selection,
//! and the placeholder-variable map. Each piece lives in a
//! `tokio::sync::watch` channel, so consumers subscribe for change
//! notification instead of polling ambient globals. One store is
//! constructed per application session; [`PatternStore::reset`] returns it
//! to the initial state on logout or navigation.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::watch;
use url::Url;

use patternbox_api::{ApiClient, EntityStore, Error, SaveTarget};

use crate::pattern::{filter_by_language, DescriptionManifest, Pattern};

const ENTITY_TYPE: &str = "patterns";
const MANIFEST_PATH: &str = "/data/pattern_descriptions.json";

/// Construction-time configuration for a [`PatternStore`].
#[derive(Debug, Clone)]
pub struct PatternStoreConfig {
    /// Where the static description manifest is served.
    pub manifest_url: Url,
    /// Where and how `save` posts pattern content.
    pub save_target: SaveTarget,
}

impl PatternStoreConfig {
    pub fn new(manifest_url: Url) -> Self {
        Self {
            manifest_url,
            save_target: SaveTarget::Api,
        }
    }

    /// Configuration pointing at the conventional manifest path on the
    /// given origin, e.g. `http://localhost:8080`.
    pub fn conventional(origin: &str) -> Result<Self, Error> {
        let manifest_url = Url::parse(origin)?.join(MANIFEST_PATH)?;
        Ok(Self::new(manifest_url))
    }

    pub fn with_save_target(mut self, target: SaveTarget) -> Self {
        self.save_target = target;
        self
    }
}

/// The current selection: which pattern is active and the prompt derived
/// from it. Both fields empty means nothing is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub name: String,
    pub prompt: String,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.prompt.is_empty()
    }
}

/// Fields for a pattern about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewPattern {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub body: String,
}

/// Backend record shape for a single pattern fetch. Only the body is
/// trusted from the server; display metadata comes from the manifest.
#[derive(Debug, Deserialize)]
struct PatternRecord {
    #[serde(rename = "Pattern", default)]
    body: String,
}

/// Owned, observable session cache of all patterns.
pub struct PatternStore {
    entities: EntityStore,
    transport: reqwest::Client,
    manifest_url: Url,

    patterns_tx: watch::Sender<Vec<Pattern>>,
    language_tx: watch::Sender<Option<String>>,
    selection_tx: watch::Sender<Selection>,
    variables_tx: watch::Sender<HashMap<String, String>>,
}

impl PatternStore {
    pub fn new(client: Arc<ApiClient>, config: PatternStoreConfig) -> Self {
        let entities =
            EntityStore::new(client.clone(), ENTITY_TYPE).with_save_target(config.save_target);
        let transport = client.transport().clone();

        let (patterns_tx, _) = watch::channel(Vec::new());
        let (language_tx, _) = watch::channel(None);
        let (selection_tx, _) = watch::channel(Selection::default());
        let (variables_tx, _) = watch::channel(HashMap::new());

        Self {
            entities,
            transport,
            manifest_url: config.manifest_url,
            patterns_tx,
            language_tx,
            selection_tx,
            variables_tx,
        }
    }

    /// The underlying entity client, for the operations that need no cache
    /// involvement (`delete`, `exists`, `rename`, raw `get`/`save`).
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    // --- subscriptions ---

    pub fn subscribe_patterns(&self) -> watch::Receiver<Vec<Pattern>> {
        self.patterns_tx.subscribe()
    }

    pub fn subscribe_selection(&self) -> watch::Receiver<Selection> {
        self.selection_tx.subscribe()
    }

    pub fn subscribe_language(&self) -> watch::Receiver<Option<String>> {
        self.language_tx.subscribe()
    }

    pub fn subscribe_variables(&self) -> watch::Receiver<HashMap<String, String>> {
        self.variables_tx.subscribe()
    }

    // --- snapshots and derived views ---

    /// Snapshot of the full cached pattern list.
    pub fn patterns(&self) -> Vec<Pattern> {
        self.patterns_tx.borrow().clone()
    }

    /// Derived view: the cached list with the language filter applied.
    ///
    /// Recomputed from the current snapshots on every call; never mutates
    /// the cache.
    pub fn filtered_patterns(&self) -> Vec<Pattern> {
        let language = self.language_tx.borrow().clone();
        filter_by_language(&self.patterns_tx.borrow(), language.as_deref())
    }

    pub fn language(&self) -> Option<String> {
        self.language_tx.borrow().clone()
    }

    pub fn set_language(&self, language: Option<String>) {
        self.language_tx.send_replace(language);
    }

    // --- selection ---

    /// Select a pattern by name from the current cache snapshot.
    ///
    /// No fetch is issued. A name absent from the cache resets the
    /// selection to empty, discarding any prior selection.
    pub fn select_pattern(&self, name: &str) {
        let found = self
            .patterns_tx
            .borrow()
            .iter()
            .find(|p| p.name == name)
            .cloned();

        match found {
            Some(pattern) => {
                tracing::debug!(pattern = %name, body_len = pattern.body.len(), "selected pattern");
                self.selection_tx.send_replace(Selection {
                    name: pattern.name,
                    prompt: pattern.body,
                });
            }
            None => {
                tracing::debug!(pattern = %name, "pattern not in cache, clearing selection");
                self.selection_tx.send_replace(Selection::default());
            }
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection_tx.borrow().clone()
    }

    pub fn selected_name(&self) -> String {
        self.selection_tx.borrow().name.clone()
    }

    pub fn system_prompt(&self) -> String {
        self.selection_tx.borrow().prompt.clone()
    }

    /// Overwrite the prompt directly, last write wins.
    pub fn set_system_prompt(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        tracing::debug!(len = prompt.len(), "setting system prompt");
        self.selection_tx.send_modify(|s| s.prompt = prompt);
    }

    // --- placeholder variables (unrelated to persistence) ---

    pub fn variables(&self) -> HashMap<String, String> {
        self.variables_tx.borrow().clone()
    }

    pub fn variable(&self, name: &str) -> Option<String> {
        self.variables_tx.borrow().get(name).cloned()
    }

    pub fn set_variable(&self, name: impl Into<String>, value: impl Into<String>) {
        self.variables_tx
            .send_modify(|vars| {
                vars.insert(name.into(), value.into());
            });
    }

    // --- lifecycle ---

    /// Return every piece of session state to its initial value.
    pub fn reset(&self) {
        self.patterns_tx.send_replace(Vec::new());
        self.language_tx.send_replace(None);
        self.selection_tx.send_replace(Selection::default());
        self.variables_tx.send_replace(HashMap::new());
    }

    // --- loading ---

    /// Reload the whole pattern collection, replacing the cache wholesale.
    ///
    /// Two phases: the description manifest and the backend name list are
    /// fetched in sequence, then one fetch per name fans out concurrently.
    /// A per-name failure degrades that record to an empty body with
    /// manifest metadata. Failure of either outer phase clears the cache
    /// and returns empty — indistinguishable from a backend with no
    /// patterns, which callers must account for.
    pub async fn load_patterns(&self) -> Vec<Pattern> {
        let loaded = match self.try_load().await {
            Ok(patterns) => patterns,
            Err(error) => {
                tracing::error!(%error, "failed to load patterns, clearing cache");
                Vec::new()
            }
        };

        self.patterns_tx.send_replace(loaded.clone());
        loaded
    }

    async fn try_load(&self) -> Result<Vec<Pattern>, Error> {
        let manifest = self.fetch_manifest().await?;
        let names = self.entities.names().await?;

        let fetches = names
            .into_iter()
            .map(|name| self.load_one(name, &manifest));

        Ok(join_all(fetches).await)
    }

    async fn fetch_manifest(&self) -> Result<DescriptionManifest, Error> {
        let response = self
            .transport
            .get(self.manifest_url.clone())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<DescriptionManifest>().await?)
    }

    /// Fetch one pattern body and merge in manifest metadata.
    ///
    /// A fetch failure is degraded to an empty body so one bad record
    /// cannot fail the whole load. An absent or empty manifest description
    /// falls back to the name itself.
    async fn load_one(&self, name: String, manifest: &DescriptionManifest) -> Pattern {
        let body = match self.entities.get::<PatternRecord>(&name).await {
            Ok(record) => record.body,
            Err(error) => {
                tracing::warn!(pattern = %name, %error, "failed to load pattern body");
                String::new()
            }
        };

        let entry = manifest.find(&name);
        let description = entry
            .map(|d| d.description.clone())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| name.clone());
        let tags = entry.map(|d| d.tags.clone()).unwrap_or_default();

        Pattern {
            name,
            description,
            body,
            tags,
        }
    }

    // --- creation ---

    /// Persist a new pattern, then reload the whole collection.
    ///
    /// There is no local insertion: the created record becomes visible in
    /// the cache only once the reload round-trip succeeds.
    pub async fn create_pattern(&self, new_pattern: NewPattern) -> Result<Pattern, Error> {
        let pattern = Pattern {
            name: new_pattern.name,
            description: new_pattern.description,
            body: new_pattern.body,
            tags: new_pattern.tags,
        };

        self.entities.save(&pattern.name, &pattern).await?;
        self.load_patterns().await;

        tracing::debug!(pattern = %pattern.name, "pattern created");
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_store() -> PatternStore {
        let client = Arc::new(ApiClient::new("http://localhost:9/api").unwrap());
        let config = PatternStoreConfig::conventional("http://localhost:9").unwrap();
        PatternStore::new(client, config)
    }

    fn pattern(name: &str, body: &str) -> Pattern {
        Pattern {
            name: name.to_string(),
            description: name.to_string(),
            body: body.to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn select_pattern_moves_to_selected_state() {
        let store = offline_store();
        store
            .patterns_tx
            .send_replace(vec![pattern("summarize", "You are a summarizer.")]);

        store.select_pattern("summarize");

        assert_eq!(store.selected_name(), "summarize");
        assert_eq!(store.system_prompt(), "You are a summarizer.");
    }

    #[test]
    fn select_missing_pattern_resets_prior_selection() {
        let store = offline_store();
        store
            .patterns_tx
            .send_replace(vec![pattern("summarize", "You are a summarizer.")]);

        store.select_pattern("summarize");
        store.select_pattern("missing");

        assert!(store.selection().is_empty());
    }

    #[test]
    fn filtered_patterns_apply_language_without_mutating_cache() {
        let store = offline_store();
        store.patterns_tx.send_replace(vec![
            pattern("xx_a", ""),
            pattern("yy_b", ""),
            pattern("c", ""),
        ]);

        store.set_language(Some("xx".to_string()));
        let names: Vec<String> = store
            .filtered_patterns()
            .into_iter()
            .map(|p| p.name)
            .collect();

        assert_eq!(names, vec!["xx_a", "c"]);
        assert_eq!(store.patterns().len(), 3);
    }

    #[test]
    fn set_system_prompt_is_last_write_wins() {
        let store = offline_store();
        store.set_system_prompt("first");
        store.set_system_prompt("second");
        assert_eq!(store.system_prompt(), "second");
    }

    #[test]
    fn variables_are_independent_of_persistence() {
        let store = offline_store();
        store.set_variable("tone", "formal");
        store.set_variable("tone", "casual");

        assert_eq!(store.variable("tone"), Some("casual".to_string()));
        assert_eq!(store.variables().len(), 1);
    }

    #[test]
    fn reset_returns_all_state_to_initial() {
        let store = offline_store();
        store.patterns_tx.send_replace(vec![pattern("a", "body")]);
        store.set_language(Some("xx".to_string()));
        store.select_pattern("a");
        store.set_variable("k", "v");

        store.reset();

        assert!(store.patterns().is_empty());
        assert!(store.language().is_none());
        assert!(store.selection().is_empty());
        assert!(store.variables().is_empty());
    }

    #[test]
    fn subscribers_observe_replacement() {
        let store = offline_store();
        let rx = store.subscribe_patterns();

        store.patterns_tx.send_replace(vec![pattern("a", "")]);

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow().len(), 1);
    }
}
