//! Host facts the cache depends on: what kind of machine we run on and how
//! big the display is.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Desktop,
    Mobile,
    Web,
}

impl HostKind {
    #[cfg(any(target_os = "android", target_os = "ios"))]
    pub const fn current() -> Self {
        Self::Mobile
    }

    #[cfg(all(target_arch = "wasm32", not(any(target_os = "android", target_os = "ios"))))]
    pub const fn current() -> Self {
        Self::Web
    }

    #[cfg(not(any(target_os = "android", target_os = "ios", target_arch = "wasm32")))]
    pub const fn current() -> Self {
        Self::Desktop
    }

    #[inline(always)]
    pub const fn is_desktop(self) -> bool {
        matches!(self, Self::Desktop)
    }
}

/// Display size in physical pixels. Generated fonts are only valid for the
/// resolution they were generated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
