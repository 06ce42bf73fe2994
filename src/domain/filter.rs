use std::collections::HashMap;

use crate::domain::listing::{Listing, ListingStatus, MoveIn};
use crate::errors::ServerError;

/// Optional list criteria, AND-combined. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub building_name: Option<String>,
    pub sub_type: Option<String>,
    pub move_in: Option<MoveIn>,
    pub status: Option<ListingStatus>,
    pub include_deleted: bool,
}

impl ListingFilter {
    /// Build criteria from decoded query parameters. Blank values are ignored;
    /// an unknown move-in or status value is rejected.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ServerError> {
        let text = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let move_in = match text("moveIn") {
            Some(raw) => Some(
                MoveIn::parse(&raw)
                    .ok_or_else(|| ServerError::BadRequest(format!("unknown moveIn '{raw}'")))?,
            ),
            None => None,
        };
        let status = match text("status") {
            Some(raw) => Some(
                ListingStatus::parse(&raw)
                    .ok_or_else(|| ServerError::BadRequest(format!("unknown status '{raw}'")))?,
            ),
            None => None,
        };

        Ok(Self {
            search: text("search"),
            building_name: text("buildingName"),
            sub_type: text("subType").or_else(|| text("dongType")),
            move_in,
            status,
            include_deleted: matches!(
                text("includeDeleted").as_deref(),
                Some("1" | "true" | "yes")
            ),
        })
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        let f = &listing.fields;

        if listing.deleted && !self.include_deleted {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = f.building_name.to_lowercase().contains(&term)
                || f.unit_label.to_lowercase().contains(&term)
                || f.sub_type.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if self.building_name.as_ref().is_some_and(|b| *b != f.building_name) {
            return false;
        }
        if self.sub_type.as_ref().is_some_and(|s| *s != f.sub_type) {
            return false;
        }
        if self.move_in.is_some_and(|m| m != f.move_in) {
            return false;
        }
        if self.status.is_some_and(|s| s != f.status) {
            return false;
        }
        true
    }
}

/// Matching subset of `records`, relative order preserved.
pub fn filter_listings(records: &[Listing], criteria: &ListingFilter) -> Vec<Listing> {
    records
        .iter()
        .filter(|l| criteria.matches(l))
        .cloned()
        .collect()
}
