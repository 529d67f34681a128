use serde::{Deserialize, Serialize};

use super::ZONE_CATALOG;

/// A named arena location.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub description: String,
}

impl Zone {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// The full static catalog that active sets are sampled from.
    pub fn catalog() -> Vec<Zone> {
        ZONE_CATALOG
            .iter()
            .map(|(name, description)| Zone::new(*name, *description))
            .collect()
    }
}
