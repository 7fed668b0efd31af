//! Category groups: fixed bundles of well-known media directories that are
//! measured and moved together.

use std::fmt;
use std::str::FromStr;

/// A named, ordered set of relative directories under a storage root.
///
/// The declaration order of the variants is the processing order of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryGroup {
    /// Camera pictures and video.
    Dcim,
    /// Audio, including system sound directories.
    Music,
}

const DCIM_DIRS: &[&str] = &["DCIM", "Movies", "Pictures"];
const MUSIC_DIRS: &[&str] = &["Music", "Alarms", "Notifications", "Ringtones", "Podcasts"];

impl CategoryGroup {
    /// Every group, in processing order.
    pub const ALL: [CategoryGroup; 2] = [CategoryGroup::Dcim, CategoryGroup::Music];

    /// Relative directory names belonging to this group, in processing order.
    pub fn dirs(self) -> &'static [&'static str] {
        match self {
            CategoryGroup::Dcim => DCIM_DIRS,
            CategoryGroup::Music => MUSIC_DIRS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryGroup::Dcim => "Pictures and videos",
            CategoryGroup::Music => "Music and sounds",
        }
    }

    /// Sort and de-duplicate a user selection into processing order.
    pub fn normalize(selection: &[CategoryGroup]) -> Vec<CategoryGroup> {
        let mut out = selection.to_vec();
        out.sort();
        out.dedup();
        out
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CategoryGroup::Dcim => "dcim",
            CategoryGroup::Music => "music",
        })
    }
}

impl FromStr for CategoryGroup {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dcim" | "pictures" | "photos" | "video" => Ok(CategoryGroup::Dcim),
            "music" | "audio" | "sounds" => Ok(CategoryGroup::Music),
            _ => Err(format!("unknown category group: '{s}' (expected dcim or music)")),
        }
    }
}
