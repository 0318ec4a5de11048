use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Class of demand-response signal.
///
/// The name of a category is the stem of the file it is read from
/// (`dr_shed.json` -> [`Category::Shed`]). Names without a decoding rule
/// are kept as [`Category::Unknown`] so they stay visible instead of being
/// dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Prices,
    Shed,
    Limit,
    Shift,
    Track,
    Unknown(CompactString),
}

impl Category {
    /// Every category with a known descriptor shape.
    pub const KNOWN: [Category; 5] = [
        Category::Prices,
        Category::Shed,
        Category::Limit,
        Category::Shift,
        Category::Track,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "dr_prices" => Category::Prices,
            "dr_shed" => Category::Shed,
            "dr_limit" => Category::Limit,
            "dr_shift" => Category::Shift,
            "dr_track" => Category::Track,
            other => Category::Unknown(CompactString::from(other)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Prices => "dr_prices",
            Category::Shed => "dr_shed",
            Category::Limit => "dr_limit",
            Category::Shift => "dr_shift",
            Category::Track => "dr_track",
            Category::Unknown(name) => name.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown(_))
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from_name(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = CompactString::deserialize(deserializer)?;
        Ok(Category::from_name(&name))
    }
}
