//! Sibling ordering.
//!
//! DESIGN
//! ======
//! Siblings are ordered by an integer priority read the way `parseInt` reads
//! it: optional leading whitespace and sign, then as many digits as there
//! are. Anything else yields no priority.
//!
//! Two modes:
//!
//! - [`SortMode::Stable`] (default): ascending priority, nodes without a
//!   priority last, equal priorities keep their current relative order.
//! - [`SortMode::Compatible`]: the legacy comparator `p2 > p1 ? -1 : 1`,
//!   which never answers "equal" and treats a missing priority as
//!   incomparable. It is driven through a binary insertion sort that calls
//!   it as `(inserted, pivot)`, so the result is deterministic even though
//!   the comparator is not a total order.

#[cfg(test)]
#[path = "sort_test.rs"]
mod sort_test;

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Stable,
    Compatible,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "compatible" => Ok(Self::Compatible),
            other => Err(format!("unknown sort mode: {other} (expected stable or compatible)")),
        }
    }
}

/// Leading integer of `text`, `parseInt` style; runs too long for `i64` saturate.
#[must_use]
pub fn parse_priority(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(digits.len());
    let run = &digits[..end];
    if run.is_empty() {
        return None;
    }
    let value = run.bytes().fold(0_i64, |acc, b| {
        let digit = i64::from(b - b'0');
        if negative {
            acc.saturating_mul(10).saturating_sub(digit)
        } else {
            acc.saturating_mul(10).saturating_add(digit)
        }
    });
    Some(value)
}

/// Reorder `items` by the priority `key` returns for each of them.
pub fn sort_by_priority<T>(items: &mut [T], mode: SortMode, key: impl Fn(&T) -> Option<i64>) {
    match mode {
        SortMode::Stable => items.sort_by(|a, b| stable_order(key(a), key(b))),
        SortMode::Compatible => compatible_sort(items, &key),
    }
}

fn stable_order(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `p2 > p1 ? -1 : 1`; a missing priority compares false against everything.
fn legacy_compare(p1: Option<i64>, p2: Option<i64>) -> Ordering {
    match (p1, p2) {
        (Some(p1), Some(p2)) if p2 > p1 => Ordering::Less,
        _ => Ordering::Greater,
    }
}

fn compatible_sort<T>(items: &mut [T], key: &impl Fn(&T) -> Option<i64>) {
    for i in 1..items.len() {
        let pivot = key(&items[i]);
        let mut left = 0;
        let mut right = i;
        while left < right {
            let mid = left + (right - left) / 2;
            if legacy_compare(pivot, key(&items[mid])) == Ordering::Less {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        items[left..=i].rotate_right(1);
    }
}
