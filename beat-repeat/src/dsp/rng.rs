//! Random sources for probability-gated slice triggering.

/// Source of uniformly distributed 32-bit words.
///
/// The engine owns its source, so a test can inject a fixed sequence and get
/// the same trigger decisions on every run.
pub trait RandomSource {
    /// Next raw 32-bit value.
    fn next_u32(&mut self) -> u32;

    /// Next value in `[0.0, 1.0)`.
    #[inline]
    fn next_unit(&mut self) -> f32 {
        // Top 24 bits fit an f32 mantissa exactly.
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }
}

/// Marsaglia xorshift32 generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Create a generator. A zero seed would lock the generator at zero, so
    /// it is replaced with 1.
    pub const fn new(seed: u32) -> Self {
        XorShift32 {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Current internal state.
    pub fn state(&self) -> u32 {
        self.state
    }
}

impl RandomSource for XorShift32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_seed_is_replaced() {
        let mut rng = XorShift32::new(0);
        assert_eq!(rng.state(), 1);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = XorShift32::new(42);
        let mut b = XorShift32::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn known_first_value() {
        // 1 ^ (1 << 13) = 0x2001; ^ (>> 17) = 0x2001; ^ (<< 5) = 0x42021
        let mut rng = XorShift32::new(1);
        assert_eq!(rng.next_u32(), 0x0004_2021);
    }

    #[test]
    fn unit_values_in_range() {
        let mut rng = XorShift32::new(0xDEAD_BEEF);
        for _ in 0..10_000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn unit_of_max_word_stays_below_one() {
        struct Max;
        impl RandomSource for Max {
            fn next_u32(&mut self) -> u32 {
                u32::MAX
            }
        }
        assert!(Max.next_unit() < 1.0);
    }
}
