//! Card power arithmetic.

use crate::card::CardRecord;
use custody_types::Timestamp;
use custody_vrf::RandomWord;

/// Daily increment rolled from the first random word and the card's seed.
///
/// `min + (word0 + seed) mod (max − min + 1)`, where `word0` is the first
/// eight bytes of the word read big-endian. Addition wraps, so every input
/// lands in `min..=max`. Returns `None` when there is no word.
pub fn derive_increment(
    words: &[RandomWord],
    tier_seed: u64,
    min_increment: u128,
    max_increment: u128,
) -> Option<u128> {
    let word = words.first()?;
    let mut head = [0u8; 8];
    head.copy_from_slice(&word[..8]);
    let roll = u64::from_be_bytes(head).wrapping_add(tier_seed);
    let span = max_increment.checked_sub(min_increment)?.checked_add(1);
    match span {
        Some(span) => Some(min_increment + u128::from(roll) % span),
        // The range covers all of u128, so any roll is already in range.
        None => Some(u128::from(roll)),
    }
}

/// Power of `card` at `now`: initial power plus one increment per whole day.
///
/// An unresolved card has not started growing. `None` on overflow.
pub fn current_power(card: &CardRecord, now: Timestamp, day_length_secs: u64) -> Option<u128> {
    let Some(increment) = card.power_increment else {
        return Some(card.initial_power);
    };
    let days = card.creation_time.elapsed_since(now) / day_length_secs.max(1);
    let growth = increment.checked_mul(u128::from(days))?;
    card.initial_power.checked_add(growth)
}
