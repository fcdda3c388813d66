use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = FontCacheError> = std::result::Result<T, E>;

/// Fieldless mirror of [`FontCacheError`] for matching on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CatalogMissing,
    CatalogCorrupt,
    MalformedParameter,
    ArtifactMissing,
    ArtifactCorrupt,
    RasterizerFailed,
    Io,
    ConfigInvalid,
}

#[derive(Debug, Error)]
pub enum FontCacheError {
    #[error("catalog not found at {0}")]
    CatalogMissing(PathBuf),

    #[error("catalog at {path} is corrupt: {reason}")]
    CatalogCorrupt { path: PathBuf, reason: String },

    #[error("malformed font parameter: {0}")]
    MalformedParameter(String),

    #[error("generated font artifact missing: {0}")]
    ArtifactMissing(PathBuf),

    #[error("generated font artifact {path} is corrupt: {reason}")]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("rasterizer failed: {0}")]
    RasterizerFailed(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
}

impl FontCacheError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CatalogMissing(_) => ErrorKind::CatalogMissing,
            Self::CatalogCorrupt { .. } => ErrorKind::CatalogCorrupt,
            Self::MalformedParameter(_) => ErrorKind::MalformedParameter,
            Self::ArtifactMissing(_) => ErrorKind::ArtifactMissing,
            Self::ArtifactCorrupt { .. } => ErrorKind::ArtifactCorrupt,
            Self::RasterizerFailed(_) => ErrorKind::RasterizerFailed,
            Self::Io { .. } | Self::Image { .. } => ErrorKind::Io,
            Self::ConfigInvalid(_) => ErrorKind::ConfigInvalid,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt_artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArtifactCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
