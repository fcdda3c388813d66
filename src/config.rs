use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{FontCacheError, Result};
use crate::packer::DEFAULT_PAGE_SIZE;

pub const DEFAULT_GENERATED_DIR: &str = "fonts/generated";
pub const DEFAULT_CATALOG_NAME: &str = "generatedFonts.json";
pub const DEFAULT_VERSION: &str = "1.0";
/// Largest atlas page side; one RGBA page of this size is 256 MiB.
pub const MAX_PAGE_SIZE: u32 = 8192;

const SECTION: &str = "FontCache";

/// Key/value pairs of `[section]`. Other sections, comments and lines
/// without `=` are skipped; a repeated key keeps its last value.
fn read_section(text: &str, section: &str) -> HashMap<String, String> {
    let mut in_section = false;
    let mut out = HashMap::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with([';', '#']) {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = name.trim() == section;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=')
            && !key.trim().is_empty()
        {
            out.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    out
}

fn parse_flag(v: &str) -> Option<bool> {
    let v = v.trim();
    if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("on") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false")
        || v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off")
    {
        Some(false)
    } else {
        v.parse::<u8>().ok().map(|n| n != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Logical directory (forward slashes) holding catalog and artifacts.
    pub generated_dir: String,
    /// Catalog file name inside `generated_dir`.
    pub catalog_name: String,
    /// Square atlas page dimension in pixels.
    pub page_size: u32,
    /// Bump to throw away every generated font on next start.
    pub version: String,
    pub always_regenerate: bool,
    /// Desktop only: keep generated fonts under the home folder instead of
    /// next to the application. Defaults to on in debug builds.
    pub debug_home: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generated_dir: DEFAULT_GENERATED_DIR.to_string(),
            catalog_name: DEFAULT_CATALOG_NAME.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            version: DEFAULT_VERSION.to_string(),
            always_regenerate: false,
            debug_home: cfg!(debug_assertions),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: &str| Err(FontCacheError::ConfigInvalid(msg.to_string()));
        if self.generated_dir.trim_matches('/').trim().is_empty() {
            return bad("generated_dir must not be empty");
        }
        if self.catalog_name.trim().is_empty() || self.catalog_name.contains(['/', '\\']) {
            return bad("catalog_name must be a plain file name");
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(FontCacheError::ConfigInvalid(format!(
                "page_size must be within 1..={MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.version.is_empty() {
            return bad("version must not be empty");
        }
        Ok(())
    }

    /// Logical path of the catalog file.
    pub fn catalog_path(&self) -> String {
        format!("{}/{}", self.generated_dir.trim_end_matches('/'), self.catalog_name)
    }

    /// Reads `[FontCache]` from an INI file; absent keys keep their defaults.
    pub fn load_ini<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!("Font cache config loaded from {path:?}.");
                Self::from_ini_str(&text)
            }
            Err(e) => {
                warn!("Failed to load font cache config {path:?}: {e}; using defaults.");
                Self::default()
            }
        }
    }

    pub fn from_ini_str(text: &str) -> Self {
        let conf = read_section(text, SECTION);
        let default = Self::default();
        let string = |key: &str, fallback: &str| {
            conf.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| fallback.to_string())
        };
        let flag = |key: &str, fallback: bool| match conf.get(key) {
            None => fallback,
            Some(v) => parse_flag(v).unwrap_or_else(|| {
                warn!("Ignoring {SECTION}.{key}='{v}' (expected a boolean).");
                fallback
            }),
        };

        let cfg = Self {
            generated_dir: string("GeneratedDir", &default.generated_dir),
            catalog_name: string("CatalogName", &default.catalog_name),
            page_size: conf
                .get("PageSize")
                .and_then(|v| {
                    let parsed = v
                        .parse::<u32>()
                        .ok()
                        .filter(|n| (1..=MAX_PAGE_SIZE).contains(n));
                    if parsed.is_none() {
                        warn!("Ignoring {SECTION}.PageSize='{v}'.");
                    }
                    parsed
                })
                .unwrap_or(default.page_size),
            version: string("Version", &default.version),
            always_regenerate: flag("AlwaysRegenerate", default.always_regenerate),
            debug_home: flag("DebugHome", default.debug_home),
        };
        if let Err(e) = cfg.validate() {
            warn!("{e}; using defaults.");
            return default;
        }
        cfg
    }
}

// Process-wide defaults; frozen by the first read.
static GLOBAL: OnceLock<CacheConfig> = OnceLock::new();

/// Sets the process-wide defaults. Fails once they have been read or set.
pub fn install(config: CacheConfig) -> Result<()> {
    config.validate()?;
    GLOBAL.set(config).map_err(|_| {
        FontCacheError::ConfigInvalid(
            "process-wide font cache config is frozen after first use".to_string(),
        )
    })
}

pub fn get() -> &'static CacheConfig {
    GLOBAL.get_or_init(CacheConfig::default)
}

#[cfg(test)]
mod tests {
    use super::{CacheConfig, MAX_PAGE_SIZE, get, install};
    use crate::error::ErrorKind;

    #[test]
    fn defaults_match_documented_literals() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.generated_dir, "fonts/generated");
        assert_eq!(cfg.catalog_name, "generatedFonts.json");
        assert_eq!(cfg.page_size, 1024);
        assert_eq!(cfg.version, "1.0");
        assert!(!cfg.always_regenerate);
        assert_eq!(cfg.catalog_path(), "fonts/generated/generatedFonts.json");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn ini_overrides_and_falls_back() {
        let cfg = CacheConfig::from_ini_str(
            "; font cache\n[FontCache]\nGeneratedDir = cache/fonts\nPageSize=512\nVersion=2.0\n\
             AlwaysRegenerate=yes\nDebugHome=0\n[Other]\nPageSize=1\n",
        );
        assert_eq!(cfg.generated_dir, "cache/fonts");
        assert_eq!(cfg.catalog_name, "generatedFonts.json");
        assert_eq!(cfg.page_size, 512);
        assert_eq!(cfg.version, "2.0");
        assert!(cfg.always_regenerate);
        assert!(!cfg.debug_home);

        let cfg = CacheConfig::from_ini_str("[FontCache]\nPageSize=0\nAlwaysRegenerate=maybe\n");
        assert_eq!(cfg.page_size, 1024);
        assert!(!cfg.always_regenerate);

        let cfg = CacheConfig::from_ini_str("[FontCache]\nPageSize=65536\n");
        assert_eq!(cfg.page_size, 1024);
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let cases = [
            CacheConfig { page_size: 0, ..CacheConfig::default() },
            CacheConfig { page_size: MAX_PAGE_SIZE + 1, ..CacheConfig::default() },
            CacheConfig { generated_dir: "/".to_string(), ..CacheConfig::default() },
            CacheConfig { catalog_name: "a/b.json".to_string(), ..CacheConfig::default() },
            CacheConfig { version: String::new(), ..CacheConfig::default() },
        ];
        for cfg in cases {
            assert_eq!(cfg.validate().unwrap_err().kind(), ErrorKind::ConfigInvalid, "{cfg:?}");
        }
        let largest = CacheConfig { page_size: MAX_PAGE_SIZE, ..CacheConfig::default() };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn global_config_freezes_after_first_use() {
        let custom = CacheConfig {
            version: "3.1".to_string(),
            ..CacheConfig::default()
        };
        install(custom.clone()).unwrap();
        assert_eq!(get(), &custom);
        let again = install(CacheConfig::default()).unwrap_err();
        assert_eq!(again.kind(), ErrorKind::ConfigInvalid);
    }
}
