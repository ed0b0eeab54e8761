//! Template registry.
//!
//! A template is the formatting contract handed to the generation step: a
//! name plus the system prompt that tells the model which Markdown shape to
//! produce. Presets are built in and immutable. Custom templates are forked
//! from an existing entry, get a fresh `custom-<millis>` id, and live in a
//! [`KeyValueStore`] so they survive restarts.
//!
//! Mutations write through to the store immediately and every query re-reads
//! it, so there is no cache that can go stale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::util::time_now_millis;

mod presets;
mod store;

pub use presets::{DEFAULT_TEMPLATE_ID, presets};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

/// Prefix of every custom template id. No preset id starts with it.
pub const CUSTOM_ID_PREFIX: &str = "custom-";

/// Store key holding the custom templates as a JSON object.
pub const TEMPLATES_KEY: &str = "gijiroku.templates";

/// Store key holding the id of the template selected for generation.
pub const SELECTED_KEY: &str = "gijiroku.selected-template";

/// Appended to the name of a forked template.
const COPY_SUFFIX: &str = "（コピー）";

/// A named formatting contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub system_prompt: String,
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

/// Persisted form of a custom template (the id is the map key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTemplate {
    name: String,
    system_prompt: String,
}

/// Whether `id` names a built-in preset.
pub fn is_preset(id: &str) -> bool {
    presets().iter().any(|t| t.id == id)
}

/// Registry of preset and custom templates backed by a key/value store.
#[derive(Debug)]
pub struct TemplateRegistry<S> {
    store: S,
    last_issued: i64,
}

impl<S: KeyValueStore> TemplateRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            last_issued: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Presets in their fixed order, then custom templates by ascending id.
    pub fn list_all(&self) -> Vec<Template> {
        let mut all = presets();
        all.extend(self.load_custom().into_iter().map(|(id, stored)| Template {
            id,
            name: stored.name,
            system_prompt: stored.system_prompt,
        }));
        all
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Result<Template> {
        if let Some(preset) = presets().into_iter().find(|t| t.id == id) {
            return Ok(preset);
        }
        self.load_custom()
            .remove(id)
            .map(|stored| Template {
                id: id.to_string(),
                name: stored.name,
                system_prompt: stored.system_prompt,
            })
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    /// Look up a template, falling back to the default preset.
    pub fn get_or_default(&self, id: &str) -> Template {
        match self.get(id) {
            Ok(template) => template,
            Err(e) => {
                warn!(error = %e, "falling back to default template");
                self.default_template()
            }
        }
    }

    pub fn is_preset(&self, id: &str) -> bool {
        is_preset(id)
    }

    /// Whether any template (preset or custom) has this id.
    pub fn contains(&self, id: &str) -> bool {
        is_preset(id) || self.load_custom().contains_key(id)
    }

    /// Add a custom template.
    ///
    /// Returns `false` and leaves the store untouched when the id is already
    /// taken or does not carry [`CUSTOM_ID_PREFIX`].
    pub fn add(&mut self, template: Template) -> Result<bool> {
        if !template.id.starts_with(CUSTOM_ID_PREFIX) || is_preset(&template.id) {
            debug!(id = %template.id, "rejecting template without custom id");
            return Ok(false);
        }
        let mut custom = self.load_custom();
        if custom.contains_key(&template.id) {
            debug!(id = %template.id, "rejecting duplicate template id");
            return Ok(false);
        }
        custom.insert(
            template.id.clone(),
            StoredTemplate {
                name: template.name,
                system_prompt: template.system_prompt,
            },
        );
        self.save_custom(&custom)?;
        info!(id = %template.id, "added template");
        Ok(true)
    }

    /// Replace the name and prompt of a custom template.
    ///
    /// The id of `template` is ignored. Presets and unknown ids are left
    /// alone and `false` is returned.
    pub fn update(&mut self, id: &str, template: Template) -> Result<bool> {
        if is_preset(id) {
            debug!(id, "ignoring update of preset template");
            return Ok(false);
        }
        let mut custom = self.load_custom();
        let Some(entry) = custom.get_mut(id) else {
            debug!(id, "ignoring update of unknown template");
            return Ok(false);
        };
        entry.name = template.name;
        entry.system_prompt = template.system_prompt;
        self.save_custom(&custom)?;
        info!(id, "updated template");
        Ok(true)
    }

    /// Remove a custom template. Presets are never removed.
    ///
    /// A selection pointing at the removed id is left for the caller to
    /// redirect; see [`TemplateRegistry::delete_and_reselect`].
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if is_preset(id) {
            debug!(id, "ignoring delete of preset template");
            return Ok(false);
        }
        let mut custom = self.load_custom();
        if custom.remove(id).is_none() {
            return Ok(false);
        }
        self.save_custom(&custom)?;
        info!(id, "deleted template");
        Ok(true)
    }

    /// Delete a template and move the selection to the default if it pointed there.
    pub fn delete_and_reselect(&mut self, id: &str) -> Result<bool> {
        let deleted = self.delete(id)?;
        if deleted && self.store.get(SELECTED_KEY).as_deref() == Some(id) {
            self.store.set(SELECTED_KEY, DEFAULT_TEMPLATE_ID)?;
            info!(id, "selection reset to default template");
        }
        Ok(deleted)
    }

    /// Copy an existing template into a new custom entry and persist it.
    pub fn fork(&mut self, source_id: &str) -> Result<Template> {
        let source = self.get(source_id)?;
        let template = Template {
            id: self.generate_id(),
            name: format!("{}{}", source.name, COPY_SUFFIX),
            system_prompt: source.system_prompt,
        };
        if !self.add(template.clone())? {
            return Err(Error::Store(format!(
                "generated id {} already exists",
                template.id
            )));
        }
        Ok(template)
    }

    /// Generate an unused custom id from the current time.
    ///
    /// Ids are strictly increasing within a registry, even when called
    /// several times in the same millisecond.
    pub fn generate_id(&mut self) -> String {
        let stamp = next_stamp(time_now_millis(), self.last_issued, &self.load_custom());
        self.last_issued = stamp;
        format!("{CUSTOM_ID_PREFIX}{stamp}")
    }

    /// Id of the selected template, or the default when unset or stale.
    pub fn selected_id(&self) -> String {
        match self.store.get(SELECTED_KEY) {
            Some(id) if self.contains(&id) => id,
            Some(id) => {
                warn!(%id, "selected template no longer exists");
                DEFAULT_TEMPLATE_ID.to_string()
            }
            None => DEFAULT_TEMPLATE_ID.to_string(),
        }
    }

    pub fn selected(&self) -> Template {
        self.get_or_default(&self.selected_id())
    }

    /// Select a template for generation.
    pub fn select(&mut self, id: &str) -> Result<()> {
        if !self.contains(id) {
            return Err(Error::TemplateNotFound(id.to_string()));
        }
        self.store.set(SELECTED_KEY, id)
    }

    fn default_template(&self) -> Template {
        presets()
            .into_iter()
            .find(|t| t.id == DEFAULT_TEMPLATE_ID)
            .unwrap_or_else(|| Template::new(DEFAULT_TEMPLATE_ID, "", ""))
    }

    fn load_custom(&self) -> BTreeMap<String, StoredTemplate> {
        let Some(raw) = self.store.get(TEMPLATES_KEY) else {
            return BTreeMap::new();
        };
        match serde_json::from_str::<BTreeMap<String, StoredTemplate>>(&raw) {
            // Entries that could shadow a preset are never honored.
            Ok(mut custom) => {
                custom.retain(|id, _| !is_preset(id));
                custom
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable custom templates");
                BTreeMap::new()
            }
        }
    }

    fn save_custom(&mut self, custom: &BTreeMap<String, StoredTemplate>) -> Result<()> {
        let json = serde_json::to_string(custom)?;
        self.store.set(TEMPLATES_KEY, &json)
    }
}

/// First stamp at or after `now` that is past `last_issued` and not taken.
fn next_stamp(now: i64, last_issued: i64, taken: &BTreeMap<String, StoredTemplate>) -> i64 {
    let mut stamp = now.max(last_issued + 1);
    while taken.contains_key(&format!("{CUSTOM_ID_PREFIX}{stamp}")) {
        stamp += 1;
    }
    stamp
}
