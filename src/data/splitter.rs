// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles pairs and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used to pick the best checkpoint and to
//                     decide when to stop early
//
// The split happens on sentence pairs, before the reverse
// direction is added, so a sentence never appears in training in
// one direction and in validation in the other.
//
// The shuffle is seeded (training.seed) so two runs over the same
// corpus hold out the same pairs.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// `val_fraction` of the items (rounded) go to validation, but at
/// least one item always stays in training.
pub fn split_train_val<T>(mut samples: Vec<T>, val_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total     = samples.len();
    let val_count = ((total as f64) * val_fraction).round() as usize;
    // Clamp so tiny datasets still train on something
    let val_count = val_count.min(total.saturating_sub(1));

    // split_off(n) removes elements [n..] from the Vec and returns them
    let val = samples.split_off(total - val_count);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.2, 7);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.3, 7);
        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let (_, a) = split_train_val((0..40).collect::<Vec<usize>>(), 0.25, 42);
        let (_, b) = split_train_val((0..40).collect::<Vec<usize>>(), 0.25, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.2, 1);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_single_item_stays_in_training() {
        let (train, val) = split_train_val(vec![1usize], 0.9, 1);
        assert_eq!(train, vec![1]);
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 0.0, 3);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
