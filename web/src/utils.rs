use chrono::NaiveDate;
use egdle_core::Millis;

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes([
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
    ])
}

/// Hashes a seed given on the command line, numbers are taken as is.
pub(crate) fn parse_seed(seed: &str) -> u64 {
    seed.parse().unwrap_or_else(|_| {
        seed.bytes()
            .fold(0xcbf2_9ce4_8422_2325, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(0x100_0000_01b3))
    })
}

pub(crate) fn now_millis() -> Millis {
    js_sys::Date::now() as Millis
}

/// Calendar day in the player's timezone.
pub(crate) fn today() -> NaiveDate {
    let date = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(date.get_full_year() as i32, date.get_month() + 1, date.get_date())
        .unwrap_or_default()
}
