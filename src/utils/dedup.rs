//! Duplicate removal preserving first-seen order.

use std::collections::HashSet;

/// Remove later items whose key equals an earlier item's key.
///
/// O(n) with a seen-set; first occurrence wins. Idempotent.
pub fn dedup_by_key<T, K>(items: Vec<T>, key_of: K) -> Vec<T>
where
    K: Fn(&T) -> String,
{
    let mut seen = HashSet::with_capacity(items.len());
    let mut result = Vec::with_capacity(items.len());

    for item in items {
        if seen.insert(key_of(&item)) {
            result.push(item);
        }
    }

    result
}

/// Dedup key for ingredient names: case- and whitespace-insensitive.
pub fn ingredient_key(name: &str) -> String {
    name.trim().to_lowercase()
}
