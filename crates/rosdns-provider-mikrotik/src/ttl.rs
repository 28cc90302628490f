//! RouterOS duration codec for record TTLs
//!
//! RouterOS stores TTLs as compact durations (`1d`, `2h`, `30m`, `45s`) and
//! prints compound values such as `1d2h3m4s` when reading them back.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;

/// Render seconds in the coarsest unit that represents them exactly
///
/// Days, hours and minutes are tried in that order; anything else falls
/// back to seconds. Zero renders as `0s` for direct callers;
/// `record::encode` never passes zero because it omits an unset TTL.
pub fn format_ttl(secs: u64) -> String {
    if secs == 0 {
        return "0s".to_string();
    }

    for (unit, suffix) in [(DAY, 'd'), (HOUR, 'h'), (MINUTE, 'm')] {
        if secs % unit == 0 {
            return format!("{}{}", secs / unit, suffix);
        }
    }

    format!("{}s", secs)
}

/// Parse a RouterOS duration into seconds
///
/// Accepts compound unit strings (`1w2d3h4m5s`), bare integers (seconds)
/// and `hh:mm:ss`. Anything unparseable yields 0, which callers treat as
/// "no TTL".
pub fn parse_ttl(value: &str) -> u64 {
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }

    if value.contains(':') {
        return parse_clock(value).unwrap_or(0);
    }

    parse_units(value).unwrap_or_else(|| {
        tracing::debug!("Unparseable TTL value: {}", value);
        0
    })
}

fn parse_clock(value: &str) -> Option<u64> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let mut total = 0u64;
    for (part, unit) in parts.iter().zip([HOUR, MINUTE, 1]) {
        let n: u64 = part.parse().ok()?;
        total = total.checked_add(n.checked_mul(unit)?)?;
    }
    Some(total)
}

fn parse_units(value: &str) -> Option<u64> {
    let mut total = 0u64;
    let mut digits = String::new();

    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let unit = match c {
            'w' => WEEK,
            'd' => DAY,
            'h' => HOUR,
            'm' => MINUTE,
            's' => 1,
            _ => return None,
        };
        if digits.is_empty() {
            return None;
        }
        let n: u64 = digits.parse().ok()?;
        total = total.checked_add(n.checked_mul(unit)?)?;
        digits.clear();
    }

    // Trailing digits without a unit are seconds
    if !digits.is_empty() {
        let n: u64 = digits.parse().ok()?;
        total = total.checked_add(n)?;
    }

    Some(total)
}
