//! Duration formatting for log lines.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render `secs` as its non-zero day/hour/minute/second parts, e.g. `"90d 1s"`.
///
/// Vesting windows and periods are usually whole days, so they print as
/// `"360d"` rather than carrying trailing zero fields.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }
    let mut rest = secs;
    let mut parts = Vec::with_capacity(UNITS.len());
    for (size, suffix) in UNITS {
        let n = rest / size;
        rest %= size;
        if n > 0 {
            parts.push(format!("{n}{suffix}"));
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_days_stay_short() {
        assert_eq!(format_duration(360 * 86_400), "360d");
        assert_eq!(format_duration(30 * 86_400), "30d");
    }

    #[test]
    fn zero_parts_are_skipped() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3 * 3_600 + 60), "3h 1m");
        assert_eq!(format_duration(90 * 86_400 + 1), "90d 1s");
    }
}
