//! Where generated artifacts live on disk.
//!
//! Desktop debug builds keep generated fonts under the user's home folder so
//! the assets tree (and anything packaged from it) stays clean. Everything
//! else writes next to the application.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use log::{debug, warn};

use crate::platform::HostKind;

/// Home-relative folder used when `debug_home` applies.
pub const DEBUG_HOME_DIR: &str = "libgdx_generatedFonts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Probes the host and the home directory.
    pub fn new(debug_home: bool) -> Self {
        let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        let local = std::env::current_dir().unwrap_or_else(|e| {
            warn!("Could not determine working directory ({e}); using '.'");
            PathBuf::from(".")
        });
        Self::for_host(debug_home, HostKind::current(), home, local)
    }

    pub fn for_host(
        debug_home: bool,
        host: HostKind,
        home: Option<PathBuf>,
        local: PathBuf,
    ) -> Self {
        let root = match (debug_home && host.is_desktop(), home) {
            (true, Some(home)) => home.join(DEBUG_HOME_DIR),
            (true, None) => {
                warn!("Home directory unavailable; generated fonts go to {local:?}");
                local
            }
            (false, _) => local,
        };
        debug!("Generated font root: {root:?}");
        Self { root }
    }

    /// Resolver rooted at an explicit directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Logical paths use forward slashes regardless of platform.
    pub fn resolve(&self, relative: impl AsRef<str>) -> PathBuf {
        relative
            .as_ref()
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

#[cfg(test)]
mod tests {
    use super::{DEBUG_HOME_DIR, PathResolver};
    use crate::platform::HostKind;
    use std::path::PathBuf;

    #[test]
    fn desktop_debug_uses_home_subfolder() {
        let r = PathResolver::for_host(
            true,
            HostKind::Desktop,
            Some(PathBuf::from("/home/player")),
            PathBuf::from("/opt/game"),
        );
        assert_eq!(
            r.resolve("fonts/generated"),
            PathBuf::from("/home/player").join(DEBUG_HOME_DIR).join("fonts").join("generated")
        );
    }

    #[test]
    fn release_and_mobile_stay_local() {
        let home = Some(PathBuf::from("/home/player"));
        let local = PathBuf::from("/opt/game");
        let release = PathBuf::from("/opt/game").join("fonts").join("generated");

        let r = PathResolver::for_host(false, HostKind::Desktop, home.clone(), local.clone());
        assert_eq!(r.resolve("fonts/generated"), release);

        let r = PathResolver::for_host(true, HostKind::Mobile, home, local.clone());
        assert_eq!(r.resolve("fonts/generated"), release);

        let r = PathResolver::for_host(true, HostKind::Desktop, None, local);
        assert_eq!(r.resolve("./fonts//generated/"), release);
    }
}
