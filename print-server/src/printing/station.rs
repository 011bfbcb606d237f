//! Station routing
//!
//! Every ticket line lands on exactly one kitchen station. An explicit
//! station tag on the menu item wins; otherwise the category is matched
//! against keyword lists, and anything left over goes to assembly.

use shared::models::{Station, TicketLine};

const GRILL_KEYWORDS: &[&str] = &["carne", "frango", "taco", "meat", "chicken", "grill"];
const FRYER_KEYWORDS: &[&str] = &["frit", "nacho", "chips", "fried", "fries"];
const BEVERAGE_KEYWORDS: &[&str] = &["bebida", "drink", "suco", "juice", "beverage"];

/// Station for a menu category, by case-insensitive substring match
pub fn station_for_category(category: &str) -> Station {
    let category = category.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| category.contains(k));

    if matches(GRILL_KEYWORDS) {
        Station::Grill
    } else if matches(FRYER_KEYWORDS) {
        Station::Fryer
    } else if matches(BEVERAGE_KEYWORDS) {
        Station::Beverages
    } else {
        Station::Assembly
    }
}

/// Station a ticket line is prepared at
pub fn classify(line: &TicketLine) -> Station {
    match &line.menu_item {
        Some(menu_item) => menu_item
            .station
            .unwrap_or_else(|| station_for_category(&menu_item.category)),
        None => Station::Assembly,
    }
}

/// Partition lines by station
///
/// Groups come out in the fixed order grill, fryer, assembly, beverages;
/// empty stations are dropped and input order is kept inside a group.
pub fn group_by_station(lines: &[TicketLine]) -> Vec<(Station, Vec<&TicketLine>)> {
    Station::ALL
        .iter()
        .filter_map(|station| {
            let group: Vec<&TicketLine> = lines.iter().filter(|l| classify(l) == *station).collect();
            (!group.is_empty()).then_some((*station, group))
        })
        .collect()
}
