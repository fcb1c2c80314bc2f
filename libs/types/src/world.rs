//! Worlds, datacenters and retainer cities

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ids::WorldId;

/// One row of the reference world table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub id: WorldId,
    pub name: String,
    pub datacenter: String,
}

/// City a retainer is registered in.
///
/// Serialized as the game's numeric city id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    LimsaLominsa,
    Gridania,
    Uldah,
    Ishgard,
    Kugane,
    Crystarium,
}

impl City {
    pub const ALL: [City; 6] = [
        City::LimsaLominsa,
        City::Gridania,
        City::Uldah,
        City::Ishgard,
        City::Kugane,
        City::Crystarium,
    ];

    pub fn id(self) -> u8 {
        match self {
            City::LimsaLominsa => 1,
            City::Gridania => 2,
            City::Uldah => 3,
            City::Ishgard => 4,
            City::Kugane => 7,
            City::Crystarium => 10,
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|city| u64::from(city.id()) == id)
    }

    /// Match a display name loosely: case, spaces and apostrophes are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "limsalominsa" => Some(City::LimsaLominsa),
            "gridania" => Some(City::Gridania),
            "uldah" => Some(City::Uldah),
            "ishgard" => Some(City::Ishgard),
            "kugane" => Some(City::Kugane),
            "crystarium" | "thecrystarium" => Some(City::Crystarium),
            _ => None,
        }
    }

    /// Interpret an uploaded value, which may be either the id or the name.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().and_then(Self::from_id),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(Self::from_id)
                .or_else(|| Self::from_name(s)),
            _ => None,
        }
    }
}

impl Serialize for City {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.id())
    }
}

impl<'de> Deserialize<'de> for City {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        City::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("unknown retainer city: {}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_city_from_id_and_name() {
        assert_eq!(City::from_id(1), Some(City::LimsaLominsa));
        assert_eq!(City::from_id(10), Some(City::Crystarium));
        assert_eq!(City::from_id(5), None);

        assert_eq!(City::from_name("Ul'dah"), Some(City::Uldah));
        assert_eq!(City::from_name("Limsa Lominsa"), Some(City::LimsaLominsa));
        assert_eq!(City::from_name("Old Sharlayan"), None);
    }

    #[test]
    fn test_city_from_value_accepts_both_forms() {
        assert_eq!(City::from_value(&json!(7)), Some(City::Kugane));
        assert_eq!(City::from_value(&json!("7")), Some(City::Kugane));
        assert_eq!(City::from_value(&json!("Kugane")), Some(City::Kugane));
        assert_eq!(City::from_value(&json!(null)), None);
        assert_eq!(City::from_value(&json!(true)), None);
    }

    #[test]
    fn test_city_serializes_as_id() {
        assert_eq!(serde_json::to_string(&City::Ishgard).unwrap(), "4");
        let city: City = serde_json::from_str("\"Gridania\"").unwrap();
        assert_eq!(city, City::Gridania);
        assert!(serde_json::from_str::<City>("99").is_err());
    }
}
