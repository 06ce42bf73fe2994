use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::vocabulary::BuildingVocabulary;
use crate::errors::ServerError;

pub type Amenities = BTreeSet<String>;

/// Whether the tenant has registered residence at the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MoveIn {
    #[serde(rename = "전입", alias = "moved_in")]
    MovedIn,
    #[default]
    #[serde(rename = "미전입", alias = "not_moved_in")]
    NotMovedIn,
}

impl MoveIn {
    pub const ALL: [MoveIn; 2] = [MoveIn::MovedIn, MoveIn::NotMovedIn];

    pub fn label(self) -> &'static str {
        match self {
            MoveIn::MovedIn => "전입",
            MoveIn::NotMovedIn => "미전입",
        }
    }

    /// Accepts the display label or the snake_case name.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "전입" | "moved_in" => Some(MoveIn::MovedIn),
            "미전입" | "not_moved_in" => Some(MoveIn::NotMovedIn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    #[serde(rename = "공실", alias = "vacant")]
    Vacant,
    #[serde(rename = "계약대기", alias = "under_contract")]
    UnderContract,
    #[serde(rename = "임대중", alias = "rented")]
    Rented,
}

impl ListingStatus {
    pub const ALL: [ListingStatus; 3] = [
        ListingStatus::Vacant,
        ListingStatus::UnderContract,
        ListingStatus::Rented,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ListingStatus::Vacant => "공실",
            ListingStatus::UnderContract => "계약대기",
            ListingStatus::Rented => "임대중",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "공실" | "vacant" => Some(ListingStatus::Vacant),
            "계약대기" | "under_contract" => Some(ListingStatus::UnderContract),
            "임대중" | "rented" => Some(ListingStatus::Rented),
            _ => None,
        }
    }
}

impl fmt::Display for MoveIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Both enums are stored as their display labels.
macro_rules! label_sql {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.label()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let raw = value.as_str()?;
                <$ty>::parse(raw).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {} '{}'", stringify!($ty), raw).into())
                })
            }
        }
    };
}

label_sql!(MoveIn);
label_sql!(ListingStatus);

/// Writable fields of a listing, as submitted by the dashboard or an import row.
///
/// The aliases keep older front ends (`dongType`, `roomNumber`, `password`,
/// `options`) working; `null` is read as the field default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub building_name: String,
    #[serde(default, alias = "dongType", deserialize_with = "null_as_default")]
    pub sub_type: String,
    #[serde(default, alias = "roomNumber", deserialize_with = "null_as_default")]
    pub unit_label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deposit: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub monthly_rent: i64,
    #[serde(default, alias = "password", deserialize_with = "null_as_default")]
    pub access_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub move_in: MoveIn,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ListingStatus,
    #[serde(default, alias = "options", deserialize_with = "null_as_default")]
    pub amenities: Amenities,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact: String,
}

fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

impl ListingDraft {
    pub fn new(building_name: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            building_name: building_name.into(),
            sub_type: sub_type.into(),
            ..Self::default()
        }
    }

    /// Trim the identifying fields and drop blank amenities.
    pub fn normalized(mut self) -> Self {
        self.building_name = self.building_name.trim().to_string();
        self.sub_type = self.sub_type.trim().to_string();
        self.unit_label = self.unit_label.trim().to_string();
        self.amenities = self
            .amenities
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    /// Checks every gateway-level rule: building and sub-type present and
    /// consistent with the vocabulary, amounts non-negative.
    pub fn validate(&self, vocabulary: &BuildingVocabulary) -> Result<(), ServerError> {
        if self.building_name.trim().is_empty() || self.sub_type.trim().is_empty() {
            return Err(ServerError::BadRequest(
                "building and sub-type required".into(),
            ));
        }
        vocabulary
            .check(&self.building_name, &self.sub_type)
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        if self.deposit < 0 || self.monthly_rent < 0 {
            return Err(ServerError::BadRequest(
                "deposit and monthly rent must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// A stored listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ListingDraft,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl Listing {
    /// Same unit slot: used for the one-live-listing-per-unit rule.
    pub fn occupies_unit_of(&self, draft: &ListingDraft) -> bool {
        !self.deleted
            && !draft.unit_label.is_empty()
            && self.fields.building_name == draft.building_name
            && self.fields.sub_type == draft.sub_type
            && self.fields.unit_label == draft.unit_label
    }
}
