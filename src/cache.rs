//! `load_or_generate`: serve a cached bitmap font when the catalog says it is
//! still valid, otherwise rasterize, write and catalog it.
//!
//! Every failure met while inspecting the cache is reported through
//! [`CacheEvents`] and ends in regeneration. Only argument errors, rasterizer
//! failures and errors while writing the new artifact reach the caller.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::catalog::{self, Catalog, CatalogEntry, RESERVED_KEYS};
use crate::config::{self, CacheConfig};
use crate::error::{ErrorKind, FontCacheError, Result};
use crate::events::{CacheEvent, CacheEvents, LogEvents};
use crate::font::{self, BitmapFont};
use crate::packer::{DEFAULT_PADDING, PixmapPacker};
use crate::parameter::{self, FontParameter};
use crate::paths::PathResolver;
use crate::platform::Resolution;
use crate::raster::Rasterizer;
use crate::writer;

// Device names Windows refuses as file stems.
const WINDOWS_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Rejects ids that cannot name both a catalog key and a file stem.
pub fn validate_id(id: &str) -> Result<()> {
    let bad = |why: &str| Err(FontCacheError::ConfigInvalid(format!("font id '{id}' {why}")));
    if id.is_empty() {
        return bad("is empty");
    }
    if id == "." || id == ".." {
        return bad("is a relative path component");
    }
    if RESERVED_KEYS.contains(&id) {
        return bad("is a reserved catalog key");
    }
    if let Some(c) = id
        .chars()
        .find(|c| c.is_control() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
    {
        return bad(&format!("contains '{}'", c.escape_debug()));
    }
    if id.ends_with(['.', ' ']) {
        return bad("ends with a dot or space");
    }
    let stem = id.split('.').next().unwrap_or(id);
    if WINDOWS_DEVICE_NAMES.iter().any(|d| d.eq_ignore_ascii_case(stem)) {
        return bad("is a reserved device name");
    }
    Ok(())
}

pub struct FontCache {
    config: CacheConfig,
    paths: PathResolver,
    resolution: Resolution,
    events: Box<dyn CacheEvents>,
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("config", &self.config)
            .field("paths", &self.paths)
            .field("resolution", &self.resolution)
            .finish_non_exhaustive()
    }
}

impl FontCache {
    /// Cache rooted wherever the host puts generated fonts.
    pub fn new(config: CacheConfig, resolution: Resolution) -> Result<Self> {
        let paths = PathResolver::new(config.debug_home);
        Self::with_resolver(config, paths, resolution)
    }

    /// Cache using the process-wide config. Reading it freezes it.
    pub fn from_global(resolution: Resolution) -> Result<Self> {
        Self::new(config::get().clone(), resolution)
    }

    pub fn with_resolver(
        config: CacheConfig,
        paths: PathResolver,
        resolution: Resolution,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            paths,
            resolution,
            events: Box::new(LogEvents),
        })
    }

    /// Replaces the diagnostics sink.
    pub fn with_events(mut self, events: impl CacheEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The window was resized. Cached fonts from the old resolution are
    /// dropped on the next lookup.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        if self.resolution != resolution {
            debug!("Font cache resolution {} -> {}.", self.resolution, resolution);
            self.resolution = resolution;
        }
    }

    pub fn generated_dir(&self) -> PathBuf {
        self.paths.resolve(&self.config.generated_dir)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.paths.resolve(self.config.catalog_path())
    }

    pub fn load_or_generate<R: Rasterizer + ?Sized>(
        &self,
        id: &str,
        rasterizer: &mut R,
        parameter: &FontParameter,
    ) -> Result<BitmapFont> {
        validate_id(id)?;
        self.check_layout_clash(id)?;
        parameter.validate()?;
        let dir = self.generated_dir();
        let source_hash = rasterizer.source_hash();

        if self.config.always_regenerate {
            self.emit(CacheEvent::AlwaysRegenerate { id: id.to_string() });
        } else if let Some(font) = self.lookup(id, parameter, source_hash, &dir) {
            return Ok(font);
        }

        let font = self.generate(id, rasterizer, parameter, &dir)?;
        self.record(id, parameter, source_hash)?;
        Ok(font)
    }

    // The catalog shares the directory with `<id>.fnt` and `<id>/`.
    fn check_layout_clash(&self, id: &str) -> Result<()> {
        let catalog = self.config.catalog_name.as_str();
        if id.eq_ignore_ascii_case(catalog) || format!("{id}.fnt").eq_ignore_ascii_case(catalog) {
            return Err(FontCacheError::ConfigInvalid(format!(
                "font id '{id}' collides with the catalog file '{catalog}'"
            )));
        }
        Ok(())
    }

    /// Erases every generated artifact and the catalog.
    pub fn purge(&self) -> Result<()> {
        self.wipe(&self.generated_dir())
    }

    fn emit(&self, event: CacheEvent) {
        self.events.event(&event);
    }

    /// The cached font, if it may be served. `None` always comes with an
    /// event saying why.
    fn lookup(
        &self,
        id: &str,
        parameter: &FontParameter,
        source_hash: Option<u64>,
        dir: &Path,
    ) -> Option<BitmapFont> {
        let catalog = match catalog::read(&self.catalog_path()) {
            Ok(catalog) => catalog,
            Err(e) => {
                match e.kind() {
                    ErrorKind::CatalogMissing => self.emit(CacheEvent::CatalogMissing),
                    ErrorKind::CatalogCorrupt => {
                        self.emit(CacheEvent::CatalogCorrupt {
                            reason: e.to_string(),
                        });
                        self.wipe_or_warn(dir);
                    }
                    // Unreadable but possibly fine; leave the artifacts alone.
                    _ => self.emit(CacheEvent::CatalogUnreadable {
                        reason: e.to_string(),
                    }),
                }
                return None;
            }
        };

        if catalog.version != self.config.version {
            self.emit(CacheEvent::DifferentVersion {
                stored: catalog.version,
                current: self.config.version.clone(),
            });
            self.wipe_or_warn(dir);
            return None;
        }
        if catalog.resolution != self.resolution {
            self.emit(CacheEvent::DifferentResolution {
                stored: catalog.resolution,
                current: self.resolution,
            });
            self.wipe_or_warn(dir);
            return None;
        }

        let entry = match catalog.entry(id) {
            None => {
                self.emit(CacheEvent::NotCataloged { id: id.to_string() });
                return None;
            }
            Some(Err(e)) => {
                self.emit(CacheEvent::MalformedParameter {
                    id: id.to_string(),
                    reason: e.to_string(),
                });
                return None;
            }
            Some(Ok(entry)) => entry,
        };
        if !parameter::equals(&entry.parameter, parameter) {
            self.emit(CacheEvent::ParametersDiffer { id: id.to_string() });
            return None;
        }
        if entry.source_hash != source_hash {
            self.emit(CacheEvent::SourceChanged { id: id.to_string() });
            return None;
        }

        match font::load(id, dir) {
            Ok(font) => {
                self.emit(CacheEvent::Loaded { id: id.to_string() });
                Some(font)
            }
            Err(e) => {
                self.emit(CacheEvent::LoadFailed {
                    id: id.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn generate<R: Rasterizer + ?Sized>(
        &self,
        id: &str,
        rasterizer: &mut R,
        parameter: &FontParameter,
        dir: &Path,
    ) -> Result<BitmapFont> {
        let mut packer = PixmapPacker::new(self.config.page_size, DEFAULT_PADDING);
        let mut data = rasterizer
            .generate_data(parameter, &mut packer)
            .map_err(|e| match e.kind() {
                ErrorKind::RasterizerFailed | ErrorKind::ConfigInvalid => e,
                _ => FontCacheError::RasterizerFailed(format!("'{id}': {e}")),
            })?;
        packer.ensure_page();
        let pages = packer.into_pages();

        writer::write(id, &mut data, &pages, dir)?;
        let font = BitmapFont::from_parts(data, pages).map_err(|e| {
            FontCacheError::RasterizerFailed(format!("'{id}': inconsistent glyph data: {e}"))
        })?;
        self.emit(CacheEvent::Generated {
            id: id.to_string(),
            pages: font.pages().len(),
        });
        Ok(font)
    }

    /// Adds or replaces the entry for `id`. Runs only once the artifact is
    /// fully on disk.
    fn record(&self, id: &str, parameter: &FontParameter, source_hash: Option<u64>) -> Result<()> {
        let path = self.catalog_path();
        let mut catalog = match catalog::read(&path) {
            Ok(catalog) if catalog.globals_match(&self.config.version, self.resolution) => catalog,
            Ok(stale) => {
                // Entries made under other globals are no longer valid.
                debug!("Dropping {} entries cataloged under other globals.", stale.len());
                Catalog::new(&self.config.version, self.resolution)
            }
            Err(_) => Catalog::new(&self.config.version, self.resolution),
        };
        catalog.upsert_entry(
            id,
            CatalogEntry {
                parameter: *parameter,
                source_hash,
            },
        );
        catalog.set_globals(&self.config.version, self.resolution);
        catalog::write(&path, &catalog)?;
        self.emit(CacheEvent::CatalogUpdated {
            entries: catalog.len(),
        });
        Ok(())
    }

    fn wipe(&self, dir: &Path) -> Result<()> {
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                self.emit(CacheEvent::Wiped {
                    dir: dir.to_path_buf(),
                });
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
            Err(e) => Err(FontCacheError::io(dir, e)),
        }
    }

    fn wipe_or_warn(&self, dir: &Path) {
        if let Err(e) = self.wipe(dir) {
            warn!("Could not erase generated fonts: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validate_id;
    use crate::error::ErrorKind;

    #[test]
    fn accepts_plain_ids() {
        for id in ["small", "ui_font_16", "Menu-Big", "font.v2"] {
            assert!(validate_id(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn rejects_ids_unusable_as_keys_or_file_names() {
        for id in [
            "",
            ".",
            "..",
            "version",
            "resolutionWidth",
            "resolutionHeight",
            "a/b",
            "a\\b",
            "c:d",
            "what?",
            "tab\tid",
            "trailing.",
            "nul",
            "COM1.fnt",
        ] {
            let err = validate_id(id).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigInvalid, "{id:?}");
        }
    }
}
