use chrono::{DateTime, Utc};
use rand::Rng;

/// Builds a transaction reference from an explicit timestamp and random
/// source.
///
/// The output sorts by creation time (date and time lead the string) and the
/// microsecond plus random suffix make collisions between concurrent calls
/// implausible. Both inputs are injected so tests can pin the result.
///
/// Adapters call this only when the caller supplies no reference of their
/// own; a caller-supplied reference is always passed through untouched.
pub fn generate_reference(now: DateTime<Utc>, rng: &mut impl Rng) -> String {
    format!(
        "{}.{:06}.C{:05}",
        now.format("%Y%m%d.%H%M%S"),
        now.timestamp_subsec_micros(),
        rng.gen_range(0..100_000u32)
    )
}
