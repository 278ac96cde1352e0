//! Division catalog.
//!
//! Values are what the backend stores; labels are what the dashboard shows.

use crate::records::UNKNOWN_DIVISION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Division {
    pub value: &'static str,
    pub label: &'static str,
}

const fn div(value: &'static str, label: &'static str) -> Division {
    Division { value, label }
}

/// Every routable division, in dashboard order.
pub const DIVISIONS: &[Division] = &[
    div("MAHALUNGE", "Mahalunge"),
    div("CHAKAN", "Chakan"),
    div("DIGHI ALANDI", "Dighi-Alandi"),
    div("BHOSARI", "Bhosari"),
    div("TALWADE", "Talwade"),
    div("PIMPRI", "Pimpri"),
    div("CHINCHWAD", "Chinchwad"),
    div("NIGDI", "Nigdi"),
    div("SANGAVI", "Sangavi"),
    div("HINJEWADI", "Hinjewadi"),
    div("WAKAD", "Wakad"),
    div("BAVDHAN", "Bavdhan"),
    div("DEHUROAD", "Dehuroad"),
    div("TALEGAON", "Talegaon"),
];

/// Catch-all bucket for records without a division. Filterable, but not a
/// broadcast target.
pub const UNKNOWN: Division = div("UNKNOWN", UNKNOWN_DIVISION);

/// Find a division by value or label, ignoring case.
pub fn lookup(name: &str) -> Option<Division> {
    let name = name.trim();
    DIVISIONS
        .iter()
        .chain(std::iter::once(&UNKNOWN))
        .find(|d| d.value.eq_ignore_ascii_case(name) || d.label.eq_ignore_ascii_case(name))
        .copied()
}

/// Display label for a stored division value; unknown values pass through.
pub fn label_for(value: &str) -> &str {
    match lookup(value) {
        Some(d) => d.label,
        None => value,
    }
}

/// Whether two division names refer to the same division, accepting
/// catalog values and labels interchangeably.
pub fn same_division(a: &str, b: &str) -> bool {
    match (lookup(a), lookup(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}
