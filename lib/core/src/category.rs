//! The fixed outfit-assembly sequence.
//!
//! A session walks [`Category::ALL`] front to back, one selection per slot.
//! [`Category::next`] is the only transition; nothing else does index arithmetic
//! on the sequence.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
    Outerwear,
    Bag,
    Shoes,
}

impl Category {
    /// Assembly order.
    pub const ALL: [Category; 5] = [
        Category::Top,
        Category::Bottom,
        Category::Outerwear,
        Category::Bag,
        Category::Shoes,
    ];

    #[inline]
    pub fn first() -> Category {
        Category::ALL[0]
    }

    /// The slot after this one, `None` for the last slot.
    #[inline]
    pub fn next(self) -> Option<Category> {
        match self {
            Category::Top => Some(Category::Bottom),
            Category::Bottom => Some(Category::Outerwear),
            Category::Outerwear => Some(Category::Bag),
            Category::Bag => Some(Category::Shoes),
            Category::Shoes => None,
        }
    }

    /// Position in [`Category::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Tag used on the wire and as the on-disk directory name.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Outerwear => "outerwear",
            Category::Bag => "bag",
            Category::Shoes => "shoes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Accepts the English tags and the crawler's Korean main-category names.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "tops" | "상의" => Ok(Category::Top),
            "bottom" | "bottoms" | "하의" => Ok(Category::Bottom),
            "outerwear" | "outer" | "아우터" => Ok(Category::Outerwear),
            "bag" | "bags" | "가방" => Ok(Category::Bag),
            "shoes" | "shoe" | "신발" => Ok(Category::Shoes),
            other => Err(Error::UnknownCategory(other.to_string())),
        }
    }
}

/// Where a session stands in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    At(Category),
    Finished,
}

impl Progress {
    pub fn start() -> Self {
        Progress::At(Category::first())
    }

    /// Number of categories already completed.
    pub fn index(self) -> usize {
        match self {
            Progress::At(category) => category.index(),
            Progress::Finished => Category::ALL.len(),
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            Progress::At(category) => Some(category),
            Progress::Finished => None,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Progress::Finished)
    }

    /// Advance by one slot. `Finished` stays `Finished`.
    pub fn advance(self) -> Self {
        match self {
            Progress::At(category) => category.next().map_or(Progress::Finished, Progress::At),
            Progress::Finished => Progress::Finished,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::start()
    }
}
