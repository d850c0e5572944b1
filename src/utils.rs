use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};

/// Builds the search random number generator.
///
/// # Parameters
/// - `seed`: `Some(value)` gives a reproducible generator. `None` seeds from
///           the current system time, so runs differ from one another.
pub fn seeded_rng(seed: Option<u64>) -> StdRng{
    let seed = seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| (elapsed.as_nanos() % u64::MAX as u128) as u64)
            .unwrap_or_default()
    });

    StdRng::seed_from_u64(seed)
}

/// Picks one element uniformly at random.
///
/// Used to break ties without favouring the first or last candidate.
///
/// # Returns
/// `None` only when `items` is empty.
pub fn choose_uniform<T: Copy>(items: &[T], rng: &mut StdRng) -> Option<T>{
    items.choose(rng).copied()
}
