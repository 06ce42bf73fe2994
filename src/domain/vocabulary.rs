use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingEntry {
    pub name: String,
    pub sub_types: Vec<String>,
}

/// The fixed building → sub-unit type vocabulary.
/// Order is kept as given; it is the order used in error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingVocabulary {
    buildings: Vec<BuildingEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VocabularyError {
    #[error("unknown building '{building}' (valid buildings: {valid})")]
    UnknownBuilding { building: String, valid: String },

    #[error("sub-type '{sub_type}' is not valid for building '{building}' (valid sub-types: {valid})")]
    UnknownSubType {
        building: String,
        sub_type: String,
        valid: String,
    },
}

impl Default for BuildingVocabulary {
    fn default() -> Self {
        Self::new([
            ("타워더모스트", vec!["A타입", "B타입", "C타입", "D타입"]),
            ("해링턴타워", vec!["101동", "102동", "103동"]),
            (
                "KCC하버뷰",
                vec!["101동", "102동", "원룸형(도생)", "원룸형(오피)"],
            ),
        ])
    }
}

impl BuildingVocabulary {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        Self {
            buildings: entries
                .into_iter()
                .map(|(name, subs)| BuildingEntry {
                    name: name.into(),
                    sub_types: subs.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    /// Load a vocabulary file: `[{"name": "...", "subTypes": ["..."]}]`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ServerError::BadRequest(format!("read vocabulary {}: {e}", path.display()))
        })?;
        let vocab: Self = serde_json::from_str(&raw).map_err(|e| {
            ServerError::BadRequest(format!("parse vocabulary {}: {e}", path.display()))
        })?;
        if vocab.buildings.is_empty() {
            return Err(ServerError::BadRequest(format!(
                "vocabulary {} lists no buildings",
                path.display()
            )));
        }
        Ok(vocab)
    }

    pub fn building_names(&self) -> impl Iterator<Item = &str> {
        self.buildings.iter().map(|b| b.name.as_str())
    }

    pub fn sub_types(&self, building: &str) -> Option<&[String]> {
        self.buildings
            .iter()
            .find(|b| b.name == building)
            .map(|b| b.sub_types.as_slice())
    }

    pub fn check(&self, building: &str, sub_type: &str) -> Result<(), VocabularyError> {
        let building = building.trim();
        let sub_type = sub_type.trim();

        let Some(subs) = self.sub_types(building) else {
            return Err(VocabularyError::UnknownBuilding {
                building: building.to_string(),
                valid: self.building_names().collect::<Vec<_>>().join(", "),
            });
        };

        if !subs.iter().any(|s| s == sub_type) {
            return Err(VocabularyError::UnknownSubType {
                building: building.to_string(),
                sub_type: sub_type.to_string(),
                valid: subs.join(", "),
            });
        }
        Ok(())
    }
}
