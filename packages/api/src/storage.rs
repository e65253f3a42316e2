//! Generic storage client for named entities.
//!
//! The backend stores several kinds of named records behind a uniform REST
//! surface; an [`EntityStore`] is a factory over one entity-type path
//! segment:
//!
//! - `get(name)` → `GET /{entity}/{name}`
//! - `names()` → `GET /{entity}/names`
//! - `delete(name)` → `DELETE /{entity}/{name}`
//! - `exists(name)` → `GET /{entity}/exists/{name}`
//! - `rename(old, new)` → `PUT /{entity}/rename/{old}/{new}`
//! - `save(name, content)` → `POST /{entity}/{name}`
//!
//! Every operation converts a backend-reported `{"error": ...}` into
//! `Err(Error::Backend(message))`, so callers use ordinary `?` handling.
//! There is no retry and no local caching; after a mutation, callers reload.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;

/// Where `save` sends content, and in what body shape.
///
/// Historically the pattern entity type saved through a separately
/// configured backend host with a narrowed `{"Pattern": <string>}` body
/// while everything else posted the full record to the API prefix. The
/// variants make that an explicit, named specialization.
#[derive(Debug, Clone, Default)]
pub enum SaveTarget {
    /// POST the full JSON-serialized content to the API base. Canonical.
    #[default]
    Api,
    /// POST `{"Pattern": <content as string>}` to `{base}/{entity}/{name}`.
    Direct { base: Url },
}

/// Typed CRUD client for one entity type.
#[derive(Clone)]
pub struct EntityStore {
    client: Arc<ApiClient>,
    entity_type: String,
    save_target: SaveTarget,
}

impl EntityStore {
    /// Create a store for the given entity-type path segment, e.g.
    /// `"patterns"` or `"contexts"`.
    pub fn new(client: Arc<ApiClient>, entity_type: impl Into<String>) -> Self {
        Self {
            client,
            entity_type: entity_type.into(),
            save_target: SaveTarget::Api,
        }
    }

    /// Override where and how `save` posts content.
    pub fn with_save_target(mut self, target: SaveTarget) -> Self {
        self.save_target = target;
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Fetch one record by name.
    pub async fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let path = format!("{}/{}", self.entity_type, name);
        let data = self.client.get::<T>(&path).await?.into_result()?;
        data.ok_or_else(|| Error::Backend(format!("empty response for {}", path)))
    }

    /// Fetch the list of all names for this entity type.
    pub async fn names(&self) -> Result<Vec<String>, Error> {
        let path = format!("{}/names", self.entity_type);
        let data = self.client.get::<Vec<String>>(&path).await?.into_result()?;
        Ok(data.unwrap_or_default())
    }

    /// Delete a record by name.
    pub async fn delete(&self, name: &str) -> Result<(), Error> {
        let path = format!("{}/{}", self.entity_type, name);
        self.client
            .delete::<serde_json::Value>(&path)
            .await?
            .into_result()?;
        Ok(())
    }

    /// Check whether a record exists.
    pub async fn exists(&self, name: &str) -> Result<bool, Error> {
        let path = format!("{}/exists/{}", self.entity_type, name);
        let data = self.client.get::<bool>(&path).await?.into_result()?;
        Ok(data.unwrap_or(false))
    }

    /// Rename a record. One request; the backend performs the rename
    /// indivisibly.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<(), Error> {
        let path = format!("{}/rename/{}/{}", self.entity_type, old_name, new_name);
        self.client
            .put::<serde_json::Value, ()>(&path, None)
            .await?
            .into_result()?;
        Ok(())
    }

    /// Upsert a record. Content may be a raw string or any serializable
    /// object; it is JSON-serialized as the request body per the configured
    /// [`SaveTarget`].
    pub async fn save<C: Serialize>(&self, name: &str, content: &C) -> Result<(), Error> {
        match &self.save_target {
            SaveTarget::Api => {
                let path = format!("{}/{}", self.entity_type, name);
                self.client
                    .post::<serde_json::Value, C>(&path, content)
                    .await?
                    .into_result()?;
                Ok(())
            }
            SaveTarget::Direct { base } => {
                let url = Url::parse(&format!(
                    "{}/{}/{}",
                    base.as_str().trim_end_matches('/'),
                    self.entity_type,
                    name
                ))?;
                let body = serde_json::json!({ "Pattern": direct_body(content)? });

                let response = self
                    .client
                    .transport()
                    .post(url)
                    .json(&body)
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let message = status.canonical_reason().unwrap_or("Unknown").to_string();
                    return Err(Error::Backend(message));
                }
                Ok(())
            }
        }
    }
}

/// Narrow arbitrary content to the string the direct save body carries.
///
/// Strings pass through. A full record is narrowed to its `Pattern` field,
/// so saving the same content through either target never double-encodes.
/// Anything else is JSON-encoded.
fn direct_body<C: Serialize>(content: &C) -> Result<String, Error> {
    match serde_json::to_value(content)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Object(map) => match map.get("Pattern") {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            _ => Ok(serde_json::Value::Object(map).to_string()),
        },
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_body_passes_strings_through() {
        assert_eq!(direct_body(&"hello").unwrap(), "hello");
    }

    #[test]
    fn direct_body_narrows_records_to_pattern_field() {
        let content = serde_json::json!({"Name": "p", "Pattern": "template text", "tags": []});
        assert_eq!(direct_body(&content).unwrap(), "template text");
    }

    #[test]
    fn direct_body_encodes_objects_without_pattern_field() {
        let content = serde_json::json!({"Name": "p", "tags": []});
        assert_eq!(direct_body(&content).unwrap(), r#"{"Name":"p","tags":[]}"#);
    }

    #[test]
    fn save_target_defaults_to_api() {
        assert!(matches!(SaveTarget::default(), SaveTarget::Api));
    }
}
