//! ISO-8601 video durations
//!
//! The metadata API reports durations as `PT#H#M#S`. Only the time part is
//! understood; day, week and fractional components are not.

const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_MINUTE: u64 = 60;

/// Parse a `PT[nH][nM][nS]` duration into whole seconds.
///
/// Unknown or unrecognized input yields 0. The pattern is matched at the
/// start of the string only; anything after the last matched component is
/// ignored. Components must appear in H, M, S order; one that does not match
/// at its position is treated as absent.
///
/// # Examples
///
/// ```
/// use mediasync_common::duration::parse_iso_duration;
///
/// assert_eq!(parse_iso_duration(Some("PT1H23M45S")), 5025);
/// assert_eq!(parse_iso_duration(Some("PT45S")), 45);
/// assert_eq!(parse_iso_duration(Some("P1D")), 0);
/// assert_eq!(parse_iso_duration(None), 0);
/// ```
pub fn parse_iso_duration(iso: Option<&str>) -> u64 {
    let Some(rest) = iso.and_then(|s| s.strip_prefix("PT")) else {
        return 0;
    };

    let mut cursor = rest;
    let mut total: u64 = 0;
    for (unit, scale) in [('H', SECS_PER_HOUR), ('M', SECS_PER_MINUTE), ('S', 1)] {
        if let Some((value, remaining)) = take_component(cursor, unit) {
            total = total.saturating_add(value.saturating_mul(scale));
            cursor = remaining;
        }
    }
    total
}

/// Match `<digits><unit>` at the start of `input`
fn take_component(input: &str, unit: char) -> Option<(u64, &str)> {
    let digits_len = input.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let remaining = input[digits_len..].strip_prefix(unit)?;

    // Digits-only, so parsing can only fail on overflow
    let value = input[..digits_len].parse::<u64>().unwrap_or(u64::MAX);
    Some((value, remaining))
}

/// Render seconds as `H:MM:SS`, or `M:SS` under an hour.
///
/// ```
/// use mediasync_common::duration::format_duration_text;
///
/// assert_eq!(format_duration_text(0), "0:00");
/// assert_eq!(format_duration_text(245), "4:05");
/// assert_eq!(format_duration_text(5025), "1:23:45");
/// ```
pub fn format_duration_text(seconds: u64) -> String {
    let hours = seconds / SECS_PER_HOUR;
    let minutes = (seconds % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let secs = seconds % SECS_PER_MINUTE;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> u64 {
        parse_iso_duration(Some(s))
    }

    #[test]
    fn test_full_duration() {
        assert_eq!(parse("PT1H23M45S"), 5025);
    }

    #[test]
    fn test_single_components() {
        assert_eq!(parse("PT45S"), 45);
        assert_eq!(parse("PT2H"), 7200);
        assert_eq!(parse("PT30M"), 1800);
        assert_eq!(parse("PT0S"), 0);
    }

    #[test]
    fn test_partial_subsets() {
        assert_eq!(parse("PT1H30S"), 3630);
        assert_eq!(parse("PT15M33S"), 933);
        assert_eq!(parse("PT1H5M"), 3900);
    }

    #[test]
    fn test_absent_and_empty_are_zero() {
        assert_eq!(parse_iso_duration(None), 0);
        assert_eq!(parse(""), 0);
    }

    #[test]
    fn test_unrecognized_is_zero() {
        assert_eq!(parse("garbage"), 0);
        assert_eq!(parse("P1D"), 0);
        assert_eq!(parse("P0D"), 0);
        assert_eq!(parse("pt5m"), 0);
    }

    #[test]
    fn test_zero_matched_groups_is_zero() {
        assert_eq!(parse("PT"), 0);
        assert_eq!(parse("PTXYZ"), 0);
    }

    #[test]
    fn test_prefix_match_ignores_trailing_text() {
        assert_eq!(parse("PT1H30SXYZ"), 3630);
        // Fractional seconds stop the match before the S component
        assert_eq!(parse("PT5M30.5S"), 300);
    }

    #[test]
    fn test_out_of_order_components() {
        // H does not match first, M does, then 2H is left unmatched
        assert_eq!(parse("PT1M2H"), 60);
        assert_eq!(parse("PT30S1H"), 30);
    }

    #[test]
    fn test_grid_of_components() {
        for h in [0u64, 1, 9, 10, 99, 123] {
            for m in [0u64, 1, 5, 59, 60, 75] {
                for s in [0u64, 1, 30, 59, 61] {
                    let iso = format!("PT{}H{}M{}S", h, m, s);
                    assert_eq!(parse(&iso), h * 3600 + m * 60 + s, "{}", iso);
                }
            }
        }
    }

    #[test]
    fn test_same_input_same_output() {
        let iso = "PT3M7S";
        assert_eq!(parse(iso), parse(iso));
    }

    #[test]
    fn test_huge_values_saturate() {
        let iso = format!("PT{}H", "9".repeat(40));
        assert_eq!(parse(&iso), u64::MAX);
    }

    #[test]
    fn test_format_duration_text() {
        assert_eq!(format_duration_text(0), "0:00");
        assert_eq!(format_duration_text(59), "0:59");
        assert_eq!(format_duration_text(300), "5:00");
        assert_eq!(format_duration_text(3600), "1:00:00");
        assert_eq!(format_duration_text(3661), "1:01:01");
    }
}
