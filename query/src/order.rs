//! Ordering and pagination.
//!
//! Rows are sorted by the tuple of their order keys, then windowed by the
//! slice. Anchors bound the window by tuple comparison: `after` keeps rows
//! strictly past the anchor in the active direction, `before` keeps rows
//! strictly short of it. A `limit` (and `offset`) with only `before` counts
//! from the end of the window.

use crate::model::{Anchor, Direction, OrderKey, Slice};
use crate::{QueryError, QueryResult};
use canopy_core::Value;
use std::cmp::Ordering;
use tracing::trace;

/// Check that anchors are used with an order and name a prefix of it.
pub fn validate_slice(order: &[OrderKey], slice: &Slice) -> QueryResult<()> {
    if !slice.has_anchor() {
        return Ok(());
    }
    if order.is_empty() {
        return Err(QueryError::AnchorWithoutOrder);
    }
    for anchor in [&slice.before, &slice.after].into_iter().flatten() {
        validate_anchor(order, anchor)?;
    }
    Ok(())
}

fn validate_anchor(order: &[OrderKey], anchor: &Anchor) -> QueryResult<()> {
    let expected = |n: usize| {
        order[..n.clamp(1, order.len())]
            .iter()
            .map(|key| key.field.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if anchor.is_empty() || anchor.len() > order.len() {
        return Err(QueryError::invalid_anchor(format!(
            "anchor must name a leading run of the order keys ({})",
            expected(order.len())
        )));
    }
    let prefix = &order[..anchor.len()];
    if let Some(key) = anchor
        .keys()
        .find(|key| !prefix.iter().any(|k| &k.field == *key))
    {
        return Err(QueryError::invalid_anchor(format!(
            "anchor key {} is not part of the order prefix ({})",
            key,
            expected(anchor.len())
        )));
    }
    Ok(())
}

/// Compare two key tuples under the order's directions.
fn compare_tuples(order: &[OrderKey], a: &[Value], b: &[Value]) -> Ordering {
    for ((key, x), y) in order.iter().zip(a).zip(b) {
        let cmp = x.cmp_sortable(y);
        if cmp != Ordering::Equal {
            return match key.direction {
                Direction::Asc => cmp,
                Direction::Desc => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}

/// The anchor's values in order-key order.
fn anchor_tuple(order: &[OrderKey], anchor: &Anchor) -> Vec<Value> {
    order[..anchor.len()]
        .iter()
        .map(|key| anchor.get(&key.field).cloned().unwrap_or_default())
        .collect()
}

/// Sort `items` by `order`, then apply `slice`.
///
/// `key` reads one order field from an item. Sorting is stable and no order
/// keeps the input order.
pub fn apply_order_and_slice<T, F>(
    items: Vec<T>,
    order: &[OrderKey],
    slice: &Slice,
    key: F,
) -> QueryResult<Vec<T>>
where
    F: Fn(&T, &str) -> Value,
{
    validate_slice(order, slice)?;
    if order.is_empty() && slice.is_unbounded() {
        return Ok(items);
    }

    let mut keyed: Vec<(Vec<Value>, T)> = items
        .into_iter()
        .map(|item| {
            let tuple = order.iter().map(|k| key(&item, &k.field)).collect();
            (tuple, item)
        })
        .collect();

    if !order.is_empty() {
        keyed.sort_by(|(a, _), (b, _)| compare_tuples(order, a, b));
    }

    if let Some(after) = &slice.after {
        let bound = anchor_tuple(order, after);
        let n = bound.len();
        keyed.retain(|(tuple, _)| compare_tuples(order, &tuple[..n], &bound) == Ordering::Greater);
    }
    if let Some(before) = &slice.before {
        let bound = anchor_tuple(order, before);
        let n = bound.len();
        keyed.retain(|(tuple, _)| compare_tuples(order, &tuple[..n], &bound) == Ordering::Less);
    }

    let len = keyed.len();
    let offset = slice.offset.unwrap_or(0);
    let (start, end) = if slice.before.is_some() && slice.after.is_none() {
        let end = len.saturating_sub(offset);
        let start = slice.limit.map_or(0, |limit| end.saturating_sub(limit));
        (start, end)
    } else {
        let start = offset.min(len);
        let end = slice
            .limit
            .map_or(len, |limit| start.saturating_add(limit).min(len));
        (start, end)
    };
    trace!(rows = len, start, end, "applied slice window");

    Ok(keyed
        .into_iter()
        .skip(start)
        .take(end - start)
        .map(|(_, item)| item)
        .collect())
}
