//! The cache index: one JSON document recording the global generation state
//! and the parameters every cached font was generated with.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "resolutionWidth": "1600",
//!   "resolutionHeight": "900",
//!   "small": { "size": 12, "borderWidth": 0.0, "borderColor": "00000000", "color": "ffffffff", "spaceY": 0 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;

use log::{debug, trace};
use serde_json::{Map, Value};

use crate::error::{FontCacheError, Result};
use crate::parameter::{self, FontParameter};
use crate::platform::Resolution;

pub const KEY_VERSION: &str = "version";
pub const KEY_RESOLUTION_WIDTH: &str = "resolutionWidth";
pub const KEY_RESOLUTION_HEIGHT: &str = "resolutionHeight";
const KEY_SOURCE_HASH: &str = "sourceHash";

/// Top-level keys that can never be font identifiers.
pub const RESERVED_KEYS: [&str; 3] = [KEY_VERSION, KEY_RESOLUTION_WIDTH, KEY_RESOLUTION_HEIGHT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub parameter: FontParameter,
    /// Fingerprint of the source font file, when the rasterizer knows it.
    pub source_hash: Option<u64>,
}

impl From<FontParameter> for CatalogEntry {
    fn from(parameter: FontParameter) -> Self {
        Self {
            parameter,
            source_hash: None,
        }
    }
}

impl CatalogEntry {
    fn encode(&self) -> Value {
        let mut record = parameter::encode(&self.parameter);
        if let (Some(hash), Some(obj)) = (self.source_hash, record.as_object_mut()) {
            obj.insert(KEY_SOURCE_HASH.to_string(), Value::String(format!("{hash:016x}")));
        }
        record
    }

    fn decode(record: &Value) -> Result<Self> {
        let parameter = parameter::decode(record)?;
        let source_hash = match record.get(KEY_SOURCE_HASH) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(u64::from_str_radix(s, 16).map_err(|_| {
                FontCacheError::MalformedParameter(format!("bad {KEY_SOURCE_HASH} '{s}'"))
            })?),
            Some(other) => {
                return Err(FontCacheError::MalformedParameter(format!(
                    "bad {KEY_SOURCE_HASH} {other}"
                )));
            }
        };
        Ok(Self {
            parameter,
            source_hash,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub version: String,
    pub resolution: Resolution,
    // Raw records; decoded on lookup so one bad entry doesn't sink the rest.
    entries: BTreeMap<String, Value>,
}

impl Catalog {
    pub fn new(version: impl Into<String>, resolution: Resolution) -> Self {
        Self {
            version: version.into(),
            resolution,
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// `None` when `id` has no entry; `Some(Err(MalformedParameter))` when
    /// the stored record can't be decoded.
    pub fn entry(&self, id: &str) -> Option<Result<CatalogEntry>> {
        self.entries.get(id).map(CatalogEntry::decode)
    }

    pub fn parameter(&self, id: &str) -> Option<Result<FontParameter>> {
        self.entry(id).map(|e| e.map(|e| e.parameter))
    }

    /// Replaces any existing `id` entry.
    pub fn upsert_entry(&mut self, id: &str, entry: impl Into<CatalogEntry>) {
        let entry = entry.into();
        if self.entries.insert(id.to_string(), entry.encode()).is_some() {
            trace!("Replaced catalog entry '{id}'.");
        }
    }

    pub fn set_globals(&mut self, version: &str, resolution: Resolution) {
        self.version = version.to_string();
        self.resolution = resolution;
    }

    #[inline(always)]
    pub fn globals_match(&self, version: &str, resolution: Resolution) -> bool {
        self.version == version && self.resolution == resolution
    }

    fn to_json(&self) -> Value {
        let mut root = Map::with_capacity(self.entries.len() + 3);
        root.insert(KEY_VERSION.to_string(), Value::String(self.version.clone()));
        root.insert(
            KEY_RESOLUTION_WIDTH.to_string(),
            Value::String(self.resolution.width.to_string()),
        );
        root.insert(
            KEY_RESOLUTION_HEIGHT.to_string(),
            Value::String(self.resolution.height.to_string()),
        );
        for (id, record) in &self.entries {
            root.insert(id.clone(), record.clone());
        }
        Value::Object(root)
    }

    fn from_json(root: Value) -> std::result::Result<Self, String> {
        let Value::Object(mut obj) = root else {
            return Err("top level is not an object".to_string());
        };

        let version = match obj.remove(KEY_VERSION) {
            Some(Value::String(s)) => s,
            Some(other) => return Err(format!("'{KEY_VERSION}' is not a string: {other}")),
            None => return Err(format!("missing '{KEY_VERSION}'")),
        };
        let width = take_dimension(&mut obj, KEY_RESOLUTION_WIDTH)?;
        let height = take_dimension(&mut obj, KEY_RESOLUTION_HEIGHT)?;

        Ok(Self {
            version,
            resolution: Resolution::new(width, height),
            entries: obj.into_iter().collect(),
        })
    }
}

/// Dimensions are written as strings but plain numbers are accepted too.
fn take_dimension(obj: &mut Map<String, Value>, key: &str) -> std::result::Result<u32, String> {
    match obj.remove(key) {
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("'{key}' is not an integer: '{s}'")),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| format!("'{key}' out of range: {n}")),
        Some(other) => Err(format!("'{key}' has unexpected type: {other}")),
        None => Err(format!("missing '{key}'")),
    }
}

pub fn read(path: &Path) -> Result<Catalog> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(FontCacheError::CatalogMissing(path.to_path_buf()));
        }
        Err(e) if e.kind() == IoErrorKind::InvalidData => {
            return Err(FontCacheError::CatalogCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
        Err(e) => return Err(FontCacheError::io(path, e)),
    };

    let corrupt = |reason: String| FontCacheError::CatalogCorrupt {
        path: path.to_path_buf(),
        reason,
    };
    let root: Value = serde_json::from_str(&text).map_err(|e| corrupt(e.to_string()))?;
    let catalog = Catalog::from_json(root).map_err(corrupt)?;
    debug!(
        "Read catalog {:?}: version {}, resolution {}, {} entries.",
        path,
        catalog.version,
        catalog.resolution,
        catalog.len()
    );
    Ok(catalog)
}

/// Whole-file replace. A torn write shows up as a corrupt catalog on the
/// next read, which regenerates everything.
pub fn write(path: &Path, catalog: &Catalog) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| FontCacheError::io(parent, e))?;
    }
    let mut text = serde_json::to_string_pretty(&catalog.to_json()).map_err(|e| {
        FontCacheError::io(path, std::io::Error::new(IoErrorKind::InvalidData, e))
    })?;
    text.push('\n');
    fs::write(path, text).map_err(|e| FontCacheError::io(path, e))?;
    debug!("Wrote catalog {:?} ({} entries).", path, catalog.len());
    Ok(())
}
