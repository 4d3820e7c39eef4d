//! Template registry.
//!
//! The registry owns the active templates and the persisted container they
//! are mirrored into. Every mutation is written back to the key/value store
//! under [`TEMPLATES_KEY`] before it returns.
//!
//! # Example
//!
//! ```ignore
//! use marble::registry::{RegistryOptions, TemplateRegistry};
//! use marble::store::MemoryStore;
//!
//! let mut registry = TemplateRegistry::open(Box::new(MemoryStore::new()), RegistryOptions::default())?;
//! let template = registry.create(&png_bytes, "Flag", [12.0, 34.0, 500.0, 500.0])?;
//! let exported = registry.export_template_as_string(&template.storage_key.to_string())?;
//! ```

pub mod types;

use std::collections::{BTreeMap, HashSet};

use image::RgbaImage;
use serde_json::Value;

use crate::codec::{
    decode_chunk, encode_chunk, export_entry, migrate, parse_import_string, AuthorCodec, ContainerMeta, Migrated,
    TemplateContainer, TemplateEntry,
};
use crate::error::{MarbleError, Result};
use crate::render::{count_required, decode_rgba, extract_palette, restore_palette, slice_template};
use crate::store::{KeyValueStore, TEMPLATES_KEY};
use crate::types::{Anchor, ChunkKey, Grid, Rgb, Template};

pub use types::{DeleteOutcome, ImportOutcome, StorageKey};

/// Settings a registry is opened with.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// World grid geometry.
    pub grid: Grid,
    /// Identity stamped on written containers.
    pub meta: ContainerMeta,
    /// Alphabet used to encode author ids.
    pub author_codec: AuthorCodec,
    /// Numeric id of the local user, encoded into new storage keys.
    pub user_id: u64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            meta: ContainerMeta::default(),
            author_codec: AuthorCodec::default(),
            user_id: 0,
        }
    }
}

/// The active templates and their persisted form.
pub struct TemplateRegistry {
    templates: Vec<Template>,
    container: TemplateContainer,
    store: Box<dyn KeyValueStore>,
    options: RegistryOptions,
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.templates.len())
            .field("last_sort_id", &self.container.last_sort_id)
            .field("options", &self.options)
            .finish()
    }
}

impl TemplateRegistry {
    /// Load the registry from `store`.
    ///
    /// A missing document yields an empty registry. A document that cannot be
    /// read is discarded and replaced by an empty one; only store failures
    /// are reported.
    pub fn open(store: Box<dyn KeyValueStore>, options: RegistryOptions) -> Result<Self> {
        let stored = store.get(TEMPLATES_KEY)?;

        let mut registry = Self {
            templates: Vec::new(),
            container: TemplateContainer::empty(&options.meta),
            store,
            options,
        };

        let Some(bytes) = stored else {
            return Ok(registry);
        };

        match load_container(&bytes, &registry.options.meta) {
            Ok(container) => {
                registry.adopt(container);
            }
            Err(reason) => {
                tracing::warn!(%reason, "stored templates unreadable, starting with an empty registry");
                registry.persist()?;
            }
        }

        Ok(registry)
    }

    /// Open a registry backed by a fresh in-memory store.
    pub fn in_memory(options: RegistryOptions) -> Self {
        Self {
            templates: Vec::new(),
            container: TemplateContainer::empty(&options.meta),
            store: Box::new(crate::store::MemoryStore::new()),
            options,
        }
    }

    /// Create a template from encoded image bytes placed at `coords`
    /// (`[tile_x, tile_y, pixel_x, pixel_y]`).
    pub fn create(&mut self, image_bytes: &[u8], name: &str, coords: [f64; 4]) -> Result<&Template> {
        let anchor = Anchor::from_values(coords)?;
        let source = decode_rgba(image_bytes)?;
        self.create_from_image(&source, name, anchor)
    }

    /// Create a template from an already decoded image.
    pub fn create_from_image(&mut self, source: &RgbaImage, name: &str, anchor: Anchor) -> Result<&Template> {
        let grid = self.options.grid;
        let sliced = slice_template(source, anchor, grid)?;
        let palette = extract_palette(&sliced.chunks, &grid);

        let sort_id = self.next_sort_id();
        let key = StorageKey::new(sort_id, self.options.author_codec.encode(self.options.user_id));
        let display_name = match name.trim() {
            "" => format!("Template {}", sort_id),
            trimmed => trimmed.to_string(),
        };

        let mut tiles = BTreeMap::new();
        for (chunk_key, chunk) in &sliced.chunks {
            tiles.insert(chunk_key.to_string(), encode_chunk(chunk)?);
        }
        let entry = TemplateEntry {
            name: Some(display_name.clone()),
            coords: Some(anchor.to_coords_string()),
            enabled: true,
            tiles,
            palette: palette.to_persisted(),
        };

        let previous_high = self.container.last_sort_id;
        self.container.templates.insert(key.to_string(), entry);
        self.record_sort_id(sort_id);
        if let Err(e) = self.persist() {
            self.container.templates.remove(&key.to_string());
            self.container.last_sort_id = previous_high;
            return Err(e);
        }

        tracing::debug!(key = %key, chunks = sliced.chunks.len(), "created template");
        self.templates.push(Template {
            storage_key: key,
            display_name,
            anchor,
            chunks: sliced.chunks,
            palette,
            required_pixel_count: sliced.required_pixel_count,
            enabled: true,
            selected: false,
        });
        Ok(&self.templates[self.templates.len() - 1])
    }

    /// Remove a template. Sort ids are never renumbered or reused.
    pub fn delete(&mut self, key: &str) -> Result<DeleteOutcome> {
        let active = self.templates.iter().position(|t| t.storage_key.to_string() == key);
        let persisted = self.container.templates.contains_key(key);
        if active.is_none() && !persisted {
            return Ok(DeleteOutcome::NotFound);
        }

        if let Ok(parsed) = key.parse::<StorageKey>() {
            self.record_sort_id(parsed.sort_id);
        }
        if let Some(index) = active {
            self.templates.remove(index);
        }
        self.container.templates.remove(key);
        self.persist()?;

        tracing::debug!(key, "deleted template");
        Ok(DeleteOutcome::Deleted)
    }

    /// Merge templates from a parsed JSON document.
    ///
    /// Entries whose key is malformed or already taken get a fresh sort id.
    pub fn import_value(&mut self, value: Value) -> Result<ImportOutcome> {
        let container = match migrate(value, &self.options.meta)? {
            Migrated::Container(container) => container,
            Migrated::Unrecognized => {
                tracing::debug!("import payload has no recognisable template shape");
                return Ok(ImportOutcome::Unrecognized);
            }
        };

        let mut imported = Vec::with_capacity(container.templates.len());
        for (raw_key, entry) in by_sort_id(container.templates) {
            let key = self.import_key(&raw_key);
            let template = reconstruct(key.clone(), &entry, &self.options.grid);

            let mut entry = entry;
            entry.palette = template.palette.to_persisted();
            entry.name = Some(template.display_name.clone());

            self.record_sort_id(key.sort_id);
            self.container.templates.insert(key.to_string(), entry);
            self.templates.push(template);
            imported.push(key);
        }

        self.persist()?;
        tracing::debug!(count = imported.len(), "imported templates");
        Ok(ImportOutcome::Imported(imported))
    }

    /// Import the opaque string produced by [`export_template_as_string`].
    ///
    /// Raw container JSON is accepted too.
    ///
    /// [`export_template_as_string`]: TemplateRegistry::export_template_as_string
    pub fn import_template_from_string(&mut self, input: &str) -> Result<ImportOutcome> {
        let value = parse_import_string(input)?;
        self.import_value(value)
    }

    /// Encode one template as a shareable string.
    pub fn export_template_as_string(&self, key: &str) -> Result<String> {
        let entry = self
            .container
            .templates
            .get(key)
            .ok_or_else(|| MarbleError::NotFound { key: key.to_string() })?;
        export_entry(&self.options.meta, key, entry)
    }

    /// Show or hide one template.
    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> Result<()> {
        self.template_mut(key)?.enabled = enabled;
        if let Some(entry) = self.container.templates.get_mut(key) {
            entry.enabled = enabled;
        }
        self.persist()
    }

    /// Show or hide every template. Returns how many changed.
    pub fn set_all_enabled(&mut self, enabled: bool) -> Result<usize> {
        let mut changed = 0;
        for template in &mut self.templates {
            if template.enabled != enabled {
                template.enabled = enabled;
                changed += 1;
            }
        }
        for entry in self.container.templates.values_mut() {
            entry.enabled = enabled;
        }
        self.persist()?;
        Ok(changed)
    }

    /// Show or hide one colour of a template.
    pub fn set_colour_enabled(&mut self, key: &str, rgb: Rgb, enabled: bool) -> Result<()> {
        let template = self.template_mut(key)?;
        if !template.palette.set_enabled(rgb, enabled) {
            return Err(MarbleError::Validation {
                message: format!("Colour {} is not used by template '{}'", rgb, key),
                help: Some(format!("Run `marble palette \"{}\"` to list its colours", key)),
            });
        }
        let persisted = template.palette.to_persisted();
        if let Some(entry) = self.container.templates.get_mut(key) {
            entry.palette = persisted;
        }
        self.persist()
    }

    /// Mark one template as selected, clearing every other selection.
    pub fn select(&mut self, key: &str) -> Result<()> {
        if self.get(key).is_none() {
            return Err(MarbleError::NotFound { key: key.to_string() });
        }
        for template in &mut self.templates {
            template.selected = template.storage_key.to_string() == key;
        }
        Ok(())
    }

    /// The selected template, falling back to the first one.
    pub fn selected_or_first(&self) -> Option<&Template> {
        self.templates
            .iter()
            .find(|t| t.selected)
            .or_else(|| self.templates.first())
    }

    /// All templates in load/creation order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Look up a template by its storage key.
    pub fn get(&self, key: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.storage_key.to_string() == key)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Enabled templates in ascending sort id order.
    pub fn active_sorted(&self) -> Vec<&Template> {
        let mut active: Vec<&Template> = self.templates.iter().filter(|t| t.enabled).collect();
        active.sort_by_key(|t| t.sort_id());
        active
    }

    /// The persisted document as it was last written.
    pub fn container(&self) -> &TemplateContainer {
        &self.container
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn grid(&self) -> &Grid {
        &self.options.grid
    }

    /// The sort id the next created or re-keyed template receives.
    pub fn next_sort_id(&self) -> u64 {
        let runtime = self.templates.iter().map(Template::sort_id).max();
        let persisted = self
            .container
            .templates
            .keys()
            .filter_map(|k| k.parse::<StorageKey>().ok())
            .map(|k| k.sort_id)
            .max();

        [self.container.last_sort_id, runtime, persisted]
            .into_iter()
            .flatten()
            .max()
            .map_or(0, |high| high + 1)
    }

    fn record_sort_id(&mut self, sort_id: u64) {
        let high = self.container.last_sort_id.map_or(sort_id, |h| h.max(sort_id));
        self.container.last_sort_id = Some(high);
    }

    fn template_mut(&mut self, key: &str) -> Result<&mut Template> {
        self.templates
            .iter_mut()
            .find(|t| t.storage_key.to_string() == key)
            .ok_or_else(|| MarbleError::NotFound { key: key.to_string() })
    }

    /// Key an imported entry is stored under.
    ///
    /// A sort id at or below the high-water mark has already been issued
    /// here, so the entry gets a fresh one and keeps its author.
    fn import_key(&self, raw: &str) -> StorageKey {
        let next = self.next_sort_id();
        match raw.parse::<StorageKey>() {
            Ok(key) if key.sort_id >= next => key,
            Ok(key) => {
                let fresh = StorageKey::new(next, key.author_id);
                tracing::debug!(from = raw, to = %fresh, "imported sort id already issued, re-keyed");
                fresh
            }
            Err(_) => {
                let fresh = StorageKey::new(next, self.options.author_codec.encode(self.options.user_id));
                tracing::debug!(from = raw, to = %fresh, "imported key malformed, re-keyed");
                fresh
            }
        }
    }

    /// Replace the runtime state with a loaded container.
    fn adopt(&mut self, container: TemplateContainer) {
        let mut rekeyed = false;
        let mut templates = BTreeMap::new();
        let entries = container.templates;

        self.container = TemplateContainer {
            templates: BTreeMap::new(),
            ..container
        };

        // Well-formed keys first so re-keyed entries cannot collide with them.
        // The first entry holding a sort id keeps it; later holders are re-keyed.
        let mut held = HashSet::new();
        let mut clashing = Vec::new();
        let mut invalid = Vec::new();
        for (raw_key, entry) in by_sort_id(entries) {
            match raw_key.parse::<StorageKey>() {
                Ok(key) if !held.insert(key.sort_id) => {
                    clashing.push((raw_key, key.author_id, entry));
                }
                Ok(key) => {
                    self.record_sort_id(key.sort_id);
                    self.container.templates.insert(key.to_string(), entry.clone());
                    templates.insert(key.to_string(), (key, entry));
                }
                Err(_) => invalid.push((raw_key, entry)),
            }
        }

        let fallback_author = self.options.author_codec.encode(self.options.user_id);
        let rekey = clashing
            .into_iter()
            .chain(invalid.into_iter().map(|(raw, entry)| (raw, fallback_author.clone(), entry)));
        for (raw_key, author, entry) in rekey {
            let key = StorageKey::new(self.next_sort_id(), author);
            tracing::warn!(from = %raw_key, to = %key, "stored template key malformed or sort id taken, re-keyed");
            self.record_sort_id(key.sort_id);
            self.container.templates.insert(key.to_string(), entry.clone());
            templates.insert(key.to_string(), (key, entry));
            rekeyed = true;
        }

        let grid = self.options.grid;
        let mut loaded: Vec<Template> = templates
            .into_values()
            .map(|(key, entry)| reconstruct(key, &entry, &grid))
            .collect();
        loaded.sort_by_key(|t| t.sort_id());
        self.templates = loaded;

        if rekeyed {
            if let Err(e) = self.persist() {
                tracing::warn!(error = %e, "could not save re-keyed templates");
            }
        }
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_vec(&self.container).map_err(|e| MarbleError::Store {
            message: format!("Failed to serialise templates: {}", e),
        })?;
        self.store.set(TEMPLATES_KEY, &json)
    }
}

/// Entries ordered by sort id, malformed keys last.
fn by_sort_id(entries: BTreeMap<String, TemplateEntry>) -> Vec<(String, TemplateEntry)> {
    let mut ordered: Vec<_> = entries.into_iter().collect();
    ordered.sort_by_key(|(raw, _)| match raw.parse::<StorageKey>() {
        Ok(key) => (false, key.sort_id),
        Err(_) => (true, 0),
    });
    ordered
}

/// Parse and migrate stored bytes into a container.
fn load_container(bytes: &[u8], meta: &ContainerMeta) -> std::result::Result<TemplateContainer, String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    match migrate(value, meta) {
        Ok(Migrated::Container(container)) => Ok(container),
        Ok(Migrated::Unrecognized) => Err("unrecognised document shape".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// Rebuild a runtime template from its persisted entry.
///
/// Tiles with malformed keys or undecodable data are skipped; the rest of
/// the template still loads.
fn reconstruct(key: StorageKey, entry: &TemplateEntry, grid: &Grid) -> Template {
    let mut chunks: BTreeMap<ChunkKey, RgbaImage> = BTreeMap::new();
    for (tile_key, data) in &entry.tiles {
        let chunk_key = match tile_key.parse::<ChunkKey>() {
            Ok(k) => k,
            Err(e) => {
                tracing::warn!(template = %key, tile = %tile_key, error = %e, "skipping tile with malformed key");
                continue;
            }
        };
        match decode_chunk(data) {
            Ok(chunk) => {
                chunks.insert(chunk_key, chunk);
            }
            Err(e) => tracing::warn!(template = %key, tile = %tile_key, error = %e, "skipping undecodable tile"),
        }
    }

    let required_pixel_count = chunks.values().map(|c| count_required(c, grid)).sum();
    let palette = restore_palette(&chunks, &entry.palette, grid);

    let anchor = entry
        .coords
        .as_deref()
        .and_then(|c| c.parse::<Anchor>().ok())
        .or_else(|| {
            chunks
                .keys()
                .next()
                .map(|k| Anchor::new(k.tile.x, k.tile.y, k.pixel_x, k.pixel_y))
        })
        .unwrap_or_default();

    let display_name = entry
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Template {}", key.sort_id));

    Template {
        storage_key: key,
        display_name,
        anchor,
        chunks,
        palette,
        required_pixel_count,
        enabled: entry.enabled,
        selected: false,
    }
}
