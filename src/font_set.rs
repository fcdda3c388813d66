//! Families of one typeface at several sizes, scaled to the current screen
//! and cached one size at a time under `<set id>_<base size>`.

use log::{debug, info};

use crate::cache::FontCache;
use crate::error::Result;
use crate::font::BitmapFont;
use crate::parameter::FontParameter;
use crate::platform::Resolution;
use crate::raster::Rasterizer;

// Font sizes are tuned against 16px text; line spacing against 20px.
const BORDER_REFERENCE_SIZE: f32 = 16.0;
const LINE_REFERENCE_SIZE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeSlot {
    Unique,
    VerySmall,
    Small,
    Medium,
    Big,
    VeryBig,
}

/// Base sizes, before any screen scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSet {
    Single {
        size: u32,
    },
    Normal {
        small: u32,
        medium: u32,
        big: u32,
    },
    Full {
        very_small: u32,
        small: u32,
        medium: u32,
        big: u32,
        very_big: u32,
    },
}

impl FontSet {
    pub const fn single(size: u32) -> Self {
        Self::Single { size }
    }

    pub const fn normal() -> Self {
        Self::Normal {
            small: 16,
            medium: 20,
            big: 26,
        }
    }

    pub const fn full() -> Self {
        Self::Full {
            very_small: 14,
            small: 16,
            medium: 20,
            big: 26,
            very_big: 30,
        }
    }

    pub fn sizes(&self) -> Vec<(SizeSlot, u32)> {
        match *self {
            Self::Single { size } => vec![(SizeSlot::Unique, size)],
            Self::Normal { small, medium, big } => vec![
                (SizeSlot::Small, small),
                (SizeSlot::Medium, medium),
                (SizeSlot::Big, big),
            ],
            Self::Full {
                very_small,
                small,
                medium,
                big,
                very_big,
            } => vec![
                (SizeSlot::VerySmall, very_small),
                (SizeSlot::Small, small),
                (SizeSlot::Medium, medium),
                (SizeSlot::Big, big),
                (SizeSlot::VeryBig, very_big),
            ],
        }
    }
}

/// How base sizes follow the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeScaling {
    Fixed,
    /// Pixels-per-inch ratio against a reference device.
    Density(f32),
    /// Current width over the width the sizes were designed for.
    Resolution { base_width: u32 },
}

impl SizeScaling {
    pub fn factor(&self, current: Resolution) -> f32 {
        match *self {
            Self::Fixed | Self::Resolution { base_width: 0 } => 1.0,
            Self::Density(d) => d,
            Self::Resolution { base_width } => current.width as f32 / base_width as f32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontSetLoader {
    pub set_id: String,
    pub set: FontSet,
    /// Template; `size`, `border_width` and `space_y` are derived per size.
    pub parameter: FontParameter,
    pub scaling: SizeScaling,
    /// Border grows with `(size / 16) ^ border_scaling`; 0 keeps it flat.
    pub border_scaling: f32,
    /// Extra line spacing at 20px, 0 for the font's own.
    pub line_height: i32,
}

impl FontSetLoader {
    pub fn new(set_id: impl Into<String>, set: FontSet, parameter: FontParameter) -> Self {
        Self {
            set_id: set_id.into(),
            set,
            parameter,
            scaling: SizeScaling::Fixed,
            border_scaling: 0.0,
            line_height: 0,
        }
    }

    pub fn cache_id(&self, base_size: u32) -> String {
        format!("{}_{}", self.set_id, base_size)
    }

    /// Parameters for one base size at the given screen resolution.
    pub fn parameter_for(&self, base_size: u32, current: Resolution) -> FontParameter {
        let factor = self.scaling.factor(current);
        let mut p = self.parameter;
        p.size = ((base_size as f32 * factor) as u32).max(1);

        let growth = if self.border_scaling == 0.0 {
            1.0
        } else {
            (base_size as f32 / BORDER_REFERENCE_SIZE).powf(self.border_scaling)
        };
        p.border_width = self.parameter.border_width * factor * growth;

        if self.line_height != 0 {
            p.space_y =
                (self.line_height as f32 * factor * (base_size as f32 / LINE_REFERENCE_SIZE)) as i32;
        }
        p
    }

    /// Loads or generates every size of the set through `cache`.
    pub fn load<R: Rasterizer + ?Sized>(
        &self,
        cache: &FontCache,
        rasterizer: &mut R,
    ) -> Result<LoadedFontSet> {
        info!("Loading font set '{}'...", self.set_id);
        let resolution = cache.resolution();
        let mut fonts = Vec::new();
        for (slot, base) in self.set.sizes() {
            let parameter = self.parameter_for(base, resolution);
            debug!("  {:?}: base {}px -> {}px", slot, base, parameter.size);
            let font = cache.load_or_generate(&self.cache_id(base), rasterizer, &parameter)?;
            fonts.push((slot, font));
        }
        Ok(LoadedFontSet { fonts })
    }
}

#[derive(Debug)]
pub struct LoadedFontSet {
    fonts: Vec<(SizeSlot, BitmapFont)>,
}

impl LoadedFontSet {
    pub fn get(&self, slot: SizeSlot) -> Option<&BitmapFont> {
        self.fonts.iter().find(|(s, _)| *s == slot).map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SizeSlot, &BitmapFont)> {
        self.fonts.iter().map(|(s, f)| (*s, f))
    }
}

#[cfg(test)]
mod tests {
    use super::{FontSet, FontSetLoader, SizeScaling, SizeSlot};
    use crate::parameter::FontParameter;
    use crate::platform::Resolution;

    fn loader() -> FontSetLoader {
        let mut template = FontParameter::default();
        template.border_width = 2.0;
        FontSetLoader::new("ui", FontSet::normal(), template)
    }

    #[test]
    fn set_shapes_list_their_slots() {
        assert_eq!(FontSet::single(18).sizes(), vec![(SizeSlot::Unique, 18)]);
        let full: Vec<u32> = FontSet::full().sizes().into_iter().map(|(_, s)| s).collect();
        assert_eq!(full, vec![14, 16, 20, 26, 30]);
    }

    #[test]
    fn resolution_factor_scales_size_and_border() {
        let mut l = loader();
        l.scaling = SizeScaling::Resolution { base_width: 800 };
        let p = l.parameter_for(20, Resolution::new(1600, 900));
        assert_eq!(p.size, 40);
        assert_eq!(p.border_width, 4.0);
        assert_eq!(p.space_y, 0);
        assert_eq!(l.cache_id(20), "ui_20");
    }

    #[test]
    fn zero_base_width_and_fixed_mean_no_scaling() {
        let r = Resolution::new(1920, 1080);
        assert_eq!(SizeScaling::Fixed.factor(r), 1.0);
        assert_eq!(SizeScaling::Resolution { base_width: 0 }.factor(r), 1.0);
        assert_eq!(SizeScaling::Density(1.5).factor(r), 1.5);
    }

    #[test]
    fn border_and_line_spacing_follow_base_size() {
        let mut l = loader();
        l.border_scaling = 1.0;
        l.line_height = 10;
        let p = l.parameter_for(32, Resolution::new(800, 600));
        assert_eq!(p.size, 32);
        assert_eq!(p.border_width, 4.0);
        assert_eq!(p.space_y, 16);
    }
}
