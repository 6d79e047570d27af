use alloc::vec::Vec;

/// Marks the entries of `seq` that lie on one longest strictly increasing subsequence.
///
/// `seq` holds old positions listed in new order; unmarked entries are the ones that have to
/// move. Ties resolve the same way for the same input, so the result is deterministic.
///
/// Runs in `O(n log n)` (patience sorting with predecessor links).
pub(crate) fn stable_mask(seq: &[usize]) -> Vec<bool> {
    let n = seq.len();
    let mut mask = alloc::vec![false; n];
    if n == 0 {
        return mask;
    }

    // tails[k] = index into `seq` of the smallest tail of an increasing run of length k + 1.
    let mut tails: Vec<usize> = Vec::with_capacity(n);
    let mut prev: Vec<Option<usize>> = alloc::vec![None; n];

    for (i, &value) in seq.iter().enumerate() {
        let k = tails.partition_point(|&t| seq[t] < value);
        if k > 0 {
            prev[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }

    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        mask[i] = true;
        cursor = prev[i];
    }
    mask
}
