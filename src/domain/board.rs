use crate::domain::filter::{filter_listings, ListingFilter};
use crate::domain::listing::Listing;
use crate::domain::stats::{aggregate, ListingStats};
use crate::errors::ServerError;
use crate::gateway::ListingGateway;

/// In-memory record array behind the list, chart and export views.
///
/// The array is only ever replaced wholesale from the gateway; the one local
/// edit allowed is dropping a record that was just deleted.
#[derive(Debug, Default)]
pub struct ListingBoard {
    records: Vec<Listing>,
}

impl ListingBoard {
    pub fn records(&self) -> &[Listing] {
        &self.records
    }

    pub fn replace(&mut self, records: Vec<Listing>) {
        self.records = records;
    }

    /// Reload every live listing from the gateway.
    pub fn refresh(&mut self, gateway: &dyn ListingGateway) -> Result<(), ServerError> {
        let records = gateway.list(&ListingFilter::default())?;
        self.replace(records);
        Ok(())
    }

    pub fn filtered(&self, criteria: &ListingFilter) -> Vec<Listing> {
        filter_listings(&self.records, criteria)
    }

    pub fn stats(&self) -> ListingStats {
        aggregate(&self.records)
    }

    /// Drop a record ahead of the authoritative reload. Returns whether it was present.
    pub fn remove_optimistic(&mut self, id: i64) -> bool {
        let before = self.records.len();
        self.records.retain(|l| l.id != id);
        self.records.len() != before
    }
}
