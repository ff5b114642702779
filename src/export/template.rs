//! Template selection
//!
//! Vans use a compact weekly layout; every other category (HGVs, plant,
//! trailers) uses the standard vehicle check sheet.

/// Vehicle classifications rendered with the van layout
const VAN_CLASSIFICATIONS: &[&str] = &["van", "vans", "lcv", "minibus", "pickup"];

/// Page layout used for one inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Standard,
    Van,
}

/// Column definition: heading and x offset in points
pub type Column = (&'static str, i64);

impl Layout {
    /// Pick a layout from a category name or vehicle type.
    ///
    /// Matching is per word and case-insensitive, so "Panel Van" and
    /// "LCV - 3.5t" are vans while "Caravan Tow" is not.
    pub fn classify(key: &str) -> Self {
        let is_van = key
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| {
                VAN_CLASSIFICATIONS
                    .iter()
                    .any(|class| word.eq_ignore_ascii_case(class))
            });

        if is_van {
            Self::Van
        } else {
            Self::Standard
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Standard => "Vehicle Inspection Report",
            Self::Van => "Van Weekly Inspection Checklist",
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        match self {
            Self::Standard => &[("No.", 50), ("Check", 90), ("Result", 380), ("Comments", 440)],
            Self::Van => &[("No.", 50), ("Day", 85), ("Check", 130), ("Result", 400), ("Notes", 455)],
        }
    }

    /// Checklist rows that fit below the header block on one page
    pub fn rows_per_page(&self) -> usize {
        match self {
            Self::Standard => 28,
            Self::Van => 32,
        }
    }

    /// Row height in points
    pub fn row_height(&self) -> i64 {
        match self {
            Self::Standard => 20,
            Self::Van => 17,
        }
    }

    pub fn shows_day_column(&self) -> bool {
        matches!(self, Self::Van)
    }
}
