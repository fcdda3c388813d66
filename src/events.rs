//! Diagnostics emitted by the cache. Every recovery path reports why it fell
//! back to generation; [`LogEvents`] forwards to `log`, [`RecordingEvents`]
//! keeps them for inspection.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::platform::Resolution;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    AlwaysRegenerate { id: String },
    CatalogMissing,
    CatalogCorrupt { reason: String },
    CatalogUnreadable { reason: String },
    DifferentVersion { stored: String, current: String },
    DifferentResolution { stored: Resolution, current: Resolution },
    NotCataloged { id: String },
    MalformedParameter { id: String, reason: String },
    ParametersDiffer { id: String },
    SourceChanged { id: String },
    LoadFailed { id: String, reason: String },
    Wiped { dir: PathBuf },
    Loaded { id: String },
    Generated { id: String, pages: usize },
    CatalogUpdated { entries: usize },
}

impl CacheEvent {
    /// Short reason for the recovery paths; `None` for plain progress events.
    pub fn reason(&self) -> Option<&'static str> {
        Some(match self {
            Self::AlwaysRegenerate { .. } => "always regenerate",
            Self::CatalogMissing => "catalog missing",
            Self::CatalogCorrupt { .. } => "catalog corrupt",
            Self::CatalogUnreadable { .. } => "catalog unreadable",
            Self::DifferentVersion { .. } => "different version",
            Self::DifferentResolution { .. } => "different resolution",
            Self::NotCataloged { .. } => "not cached yet",
            Self::MalformedParameter { .. } => "malformed parameter",
            Self::ParametersDiffer { .. } => "parameters differ",
            Self::SourceChanged { .. } => "source font changed",
            Self::LoadFailed { .. } => "could not load prior artifact",
            Self::Wiped { .. } | Self::Loaded { .. } | Self::Generated { .. } | Self::CatalogUpdated { .. } => {
                return None;
            }
        })
    }
}

impl fmt::Display for CacheEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlwaysRegenerate { id } => {
                write!(f, "always-regenerate is set; generating '{id}' without checking the cache")
            }
            Self::CatalogMissing => write!(f, "no catalog yet; generating"),
            Self::CatalogCorrupt { reason } => {
                write!(f, "catalog corrupt ({reason}); erasing generated fonts")
            }
            Self::CatalogUnreadable { reason } => {
                write!(f, "catalog unreadable ({reason}); generating without erasing")
            }
            Self::DifferentVersion { stored, current } => write!(
                f,
                "different version ({stored} -> {current}); erasing all generated fonts"
            ),
            Self::DifferentResolution { stored, current } => write!(
                f,
                "different resolution ({stored} -> {current}); erasing all generated fonts"
            ),
            Self::NotCataloged { id } => write!(f, "'{id}' not cached yet; generating"),
            Self::MalformedParameter { id, reason } => {
                write!(f, "stored parameters for '{id}' unreadable ({reason}); generating")
            }
            Self::ParametersDiffer { id } => {
                write!(f, "parameters differ for '{id}'; generating")
            }
            Self::SourceChanged { id } => write!(f, "source font changed for '{id}'; generating"),
            Self::LoadFailed { id, reason } => {
                write!(f, "could not load prior artifact '{id}' ({reason}); generating")
            }
            Self::Wiped { dir } => write!(f, "erased {dir:?}"),
            Self::Loaded { id } => write!(f, "'{id}' was already generated; loaded"),
            Self::Generated { id, pages } => write!(f, "generated '{id}' ({pages} page(s))"),
            Self::CatalogUpdated { entries } => {
                write!(f, "catalog updated ({entries} entries)")
            }
        }
    }
}

pub trait CacheEvents {
    fn event(&self, event: &CacheEvent);
}

/// Default sink: one log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEvents;

impl CacheEvents for LogEvents {
    fn event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::CatalogCorrupt { .. }
            | CacheEvent::CatalogUnreadable { .. }
            | CacheEvent::MalformedParameter { .. }
            | CacheEvent::LoadFailed { .. }
            | CacheEvent::AlwaysRegenerate { .. } => warn!("Font cache: {event}"),
            _ => info!("Font cache: {event}"),
        }
    }
}

/// Keeps every event; clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingEvents {
    events: Arc<Mutex<Vec<CacheEvent>>>,
}

impl RecordingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drains the buffer.
    pub fn take(&self) -> Vec<CacheEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn reasons(&self) -> Vec<&'static str> {
        self.events().iter().filter_map(CacheEvent::reason).collect()
    }
}

impl CacheEvents for RecordingEvents {
    fn event(&self, event: &CacheEvent) {
        LogEvents.event(event);
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
