//! Per-author index allocation

/// Smallest positive index not present in `existing`.
///
/// `existing` holds the indices already used by one author's books, in any
/// order. An author without books gets index 1.
pub fn allocate_index<I>(existing: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    let used: Vec<i32> = existing.into_iter().collect();
    let mut candidate = 1;
    while used.contains(&candidate) {
        candidate += 1;
    }
    candidate
}
