use chrono::{Datelike, NaiveDate};

use crate::*;

/// Classic switched from [`Sfc32`] to [`SeedRandom`] on this issue.
pub const LEGACY_RNG_CUTOVER: i64 = 369;

const WIDTH: f64 = 256.0;
const CHUNKS: usize = 6;
const START_DENOM: f64 = 281_474_976_710_656.0; // 256^6
const SIGNIFICANCE: f64 = 4_503_599_627_370_496.0; // 2^52
const OVERFLOW: f64 = 9_007_199_254_740_992.0; // 2^53

/// Seed string for a daily game, `{id}-{year}-{month0}-{day}-{weekday}`.
///
/// Months count from zero and weekdays from Sunday, so every player sees the
/// same puzzle as the browser version did. A non-zero `offset` is appended.
pub fn daily_seed(id: &str, today: NaiveDate, offset: u32) -> String {
    let mut seed = format!(
        "{}-{}-{}-{}-{}",
        id,
        today.year(),
        today.month0(),
        today.day(),
        today.weekday().num_days_from_sunday()
    );
    if offset != 0 {
        seed.push_str(&format!("-{offset}"));
    }
    seed
}

/// RC4 keystream as used by the string-seeded generator.
#[derive(Clone, Debug)]
struct Arc4 {
    i: u8,
    j: u8,
    s: [u8; 256],
}

impl Arc4 {
    fn new(key: &[u8]) -> Self {
        let key: &[u8] = if key.is_empty() { &[0] } else { key };
        let mut s = [0u8; 256];
        for (i, slot) in s.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut j: u8 = 0;
        for i in 0..256 {
            let t = s[i];
            j = j.wrapping_add(key[i % key.len()]).wrapping_add(t);
            s[i] = s[j as usize];
            s[j as usize] = t;
        }

        let mut arc4 = Self { i: 0, j: 0, s };
        // the first 256 bytes of RC4 are weak
        arc4.g(256);
        arc4
    }

    /// Next `count` bytes as one big-endian number.
    fn g(&mut self, count: usize) -> f64 {
        let mut r = 0.0;
        for _ in 0..count {
            self.i = self.i.wrapping_add(1);
            let t = self.s[self.i as usize];
            self.j = self.j.wrapping_add(t);
            self.s[self.i as usize] = self.s[self.j as usize];
            self.s[self.j as usize] = t;
            let k = self.s[self.i as usize].wrapping_add(t);
            r = r * WIDTH + f64::from(self.s[k as usize]);
        }
        r
    }
}

fn mix_key(seed: &str) -> Vec<u8> {
    let mut key: Vec<u8> = Vec::new();
    let mut smear: u32 = 0;
    for (j, unit) in seed.encode_utf16().enumerate() {
        let slot = j & 255;
        let previous = key.get(slot).copied().unwrap_or(0);
        smear ^= u32::from(previous) * 19;
        let mixed = (smear.wrapping_add(u32::from(unit)) & 255) as u8;
        if slot < key.len() {
            key[slot] = mixed;
        } else {
            key.push(mixed);
        }
    }
    key
}

/// String-seeded ARC4 generator, bit-compatible with the browser library the
/// game used since its second version.
#[derive(Clone, Debug)]
pub struct SeedRandom {
    arc4: Arc4,
}

impl SeedRandom {
    pub fn new(seed: &str) -> Self {
        Self {
            arc4: Arc4::new(&mix_key(seed)),
        }
    }

    /// Uniform float in `[0, 1)` with 52 bits of randomness.
    pub fn next_f64(&mut self) -> f64 {
        let mut n = self.arc4.g(CHUNKS);
        let mut d = START_DENOM;
        let mut x: u32 = 0;
        while n < SIGNIFICANCE {
            n = (n + f64::from(x)) * WIDTH;
            d *= WIDTH;
            x = self.arc4.g(1) as u32;
        }
        while n >= OVERFLOW {
            n /= 2.0;
            d /= 2.0;
            x >>= 1;
        }
        (n + f64::from(x)) / d
    }
}

/// Small fast counting generator from the first version of the game.
#[derive(Clone, Debug)]
pub struct Sfc32 {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl Sfc32 {
    pub const fn new(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// Keyed by the date the way the first version did it.
    pub fn for_day(today: NaiveDate) -> Self {
        Self::new(
            today.year() as u32,
            today.month0(),
            today.day(),
            today.weekday().num_days_from_sunday() + 1,
        )
    }

    pub fn next_f64(&mut self) -> f64 {
        let t = self.a.wrapping_add(self.b);
        self.a = self.b ^ (self.b >> 9);
        self.b = self.c.wrapping_add(self.c << 3);
        self.c = (self.c << 21) | (self.c >> 11);
        self.d = self.d.wrapping_add(1);
        let t = t.wrapping_add(self.d);
        self.c = self.c.wrapping_add(t);
        f64::from(t) / 4_294_967_296.0
    }
}

/// Day-keyed generator owned by a single game.
#[derive(Clone, Debug)]
pub enum DailyRng {
    Legacy(Sfc32),
    Seeded(SeedRandom),
}

impl DailyRng {
    pub fn for_game(kind: GameKind, issue: i64, today: NaiveDate) -> Self {
        if kind == GameKind::Classic && issue < LEGACY_RNG_CUTOVER {
            log::debug!("{}: using legacy rng for issue {}", kind.id(), issue);
            Self::Legacy(Sfc32::for_day(today))
        } else {
            Self::Seeded(SeedRandom::new(&daily_seed(kind.id(), today, kind.seed_offset())))
        }
    }

    pub fn next_f64(&mut self) -> f64 {
        match self {
            Self::Legacy(rng) => rng.next_f64(),
            Self::Seeded(rng) => rng.next_f64(),
        }
    }

    fn factor(&self) -> f64 {
        match self {
            Self::Legacy(_) => 1e16,
            Self::Seeded(_) => 1.0,
        }
    }

    /// Integer in `[0, bound)`.
    ///
    /// A zero bound returns the scaled float floored, the first version relied
    /// on that and it stays for compatibility.
    pub fn random_int(&mut self, bound: u64) -> u64 {
        let random = self.factor() * self.next_f64();
        if bound == 0 {
            return random.floor() as u64;
        }
        let bound = bound as f64;
        ((bound * random).floor() % bound) as u64
    }

    /// Shorthand for indexing into collections.
    pub fn random_index(&mut self, len: usize) -> usize {
        self.random_int(len as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn seed_random_matches_reference_values() {
        let mut rng = SeedRandom::new("hello.");
        assert_eq!(rng.next_f64(), 0.9282578795792454);
        assert_eq!(rng.next_f64(), 0.3752569768646784);
    }

    #[test]
    fn daily_seed_uses_browser_date_fields() {
        let today = date(2026, 10, 19);
        assert_eq!(daily_seed("binary", today, 0), "binary-2026-9-19-1");
        assert_eq!(daily_seed("binary", today, 2), "binary-2026-9-19-1-2");

        let mut rng = DailyRng::for_game(GameKind::Binary, 0, today);
        assert_eq!(rng.next_f64(), 0.14707858853331687);
        assert_eq!(rng.next_f64(), 0.9118480853637798);
        assert_eq!(rng.next_f64(), 0.9953426353345194);
    }

    #[test]
    fn sfc32_matches_reference_values() {
        let mut rng = Sfc32::for_day(date(2022, 4, 1));
        assert_eq!(rng.next_f64(), 4.731118679046631e-07);
        assert_eq!(rng.next_f64(), 4.6566128730773926e-09);
        assert_eq!(rng.next_f64(), 0.004398793447762728);
    }

    #[test]
    fn classic_switches_generator_on_cutover() {
        let today = date(2022, 4, 1);
        assert!(matches!(
            DailyRng::for_game(GameKind::Classic, 0, today),
            DailyRng::Legacy(_)
        ));
        assert!(matches!(
            DailyRng::for_game(GameKind::Classic, LEGACY_RNG_CUTOVER, today),
            DailyRng::Seeded(_)
        ));
        assert!(matches!(
            DailyRng::for_game(GameKind::Matcher, 0, today),
            DailyRng::Seeded(_)
        ));
    }

    #[test]
    fn random_int_scales_seeded_floats() {
        let mut rng = DailyRng::Seeded(SeedRandom::new("hello."));
        let ints: Vec<_> = (0..10).map(|_| rng.random_int(10)).collect();
        assert_eq!(ints, vec![9, 3, 7, 2, 0, 6, 8, 7, 7, 7]);
    }

    #[test]
    fn zero_bound_returns_scaled_float() {
        let mut rng = DailyRng::Seeded(SeedRandom::new("hello."));
        assert_eq!(rng.random_int(0), 0);

        let mut legacy = DailyRng::Legacy(Sfc32::for_day(date(2022, 4, 1)));
        assert_eq!(legacy.random_int(0), 4_731_118_679);
    }

    proptest! {
        #[test]
        fn random_int_is_reproducible_and_bounded(seed in "[a-z]{1,12}", bound in 1u64..1000) {
            let mut first = DailyRng::Seeded(SeedRandom::new(&seed));
            let mut second = DailyRng::Seeded(SeedRandom::new(&seed));
            for _ in 0..32 {
                let value = first.random_int(bound);
                prop_assert!(value < bound);
                prop_assert_eq!(value, second.random_int(bound));
            }
        }
    }
}
