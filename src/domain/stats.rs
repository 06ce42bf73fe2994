use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::listing::{Listing, ListingStatus};

/// One group of a chart: `bar_ratio` is relative to the largest group,
/// `total_ratio` to the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupShare {
    pub label: String,
    pub count: usize,
    pub bar_ratio: f64,
    pub total_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub status: Vec<GroupShare>,
    pub move_in: Vec<GroupShare>,
    pub building: Vec<GroupShare>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_move_in: BTreeMap<String, usize>,
    pub by_building: BTreeMap<String, usize>,
    pub avg_deposit: i64,
    pub avg_rent: i64,
    pub total_revenue: i64,
    pub charts: ChartData,
}

pub fn aggregate(records: &[Listing]) -> ListingStats {
    let total = records.len();
    if total == 0 {
        return ListingStats::default();
    }

    let mut by_status = BTreeMap::new();
    let mut by_move_in = BTreeMap::new();
    let mut by_building = BTreeMap::new();
    let mut deposit_sum: i64 = 0;
    let mut rent_sum: i64 = 0;
    let mut total_revenue: i64 = 0;

    for l in records {
        let f = &l.fields;
        *by_status.entry(f.status.label().to_string()).or_insert(0) += 1;
        *by_move_in.entry(f.move_in.label().to_string()).or_insert(0) += 1;
        *by_building.entry(f.building_name.clone()).or_insert(0) += 1;

        deposit_sum = deposit_sum.saturating_add(f.deposit);
        rent_sum = rent_sum.saturating_add(f.monthly_rent);
        if f.status == ListingStatus::Rented {
            total_revenue = total_revenue.saturating_add(f.monthly_rent);
        }
    }

    let charts = ChartData {
        status: group_shares(&by_status, total),
        move_in: group_shares(&by_move_in, total),
        building: group_shares(&by_building, total),
    };

    ListingStats {
        total,
        by_status,
        by_move_in,
        by_building,
        avg_deposit: rounded_mean(deposit_sum, total),
        avg_rent: rounded_mean(rent_sum, total),
        total_revenue,
        charts,
    }
}

/// Shares for each group. Empty input, or a zero total, yields zero ratios.
pub fn group_shares(groups: &BTreeMap<String, usize>, total: usize) -> Vec<GroupShare> {
    let max = groups.values().copied().max().unwrap_or(0);

    groups
        .iter()
        .map(|(label, &count)| GroupShare {
            label: label.clone(),
            count,
            bar_ratio: ratio(count, max),
            total_ratio: ratio(count, total),
        })
        .collect()
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn rounded_mean(sum: i64, n: usize) -> i64 {
    if n == 0 {
        return 0;
    }
    (sum as f64 / n as f64).round() as i64
}
