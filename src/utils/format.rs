const UNITS: &[&str] = &["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Formats a byte count with decimal (1000-based) units and three
/// significant digits, e.g. `189453` -> `"189 kB"`, `1500` -> `"1.5 kB"`.
pub fn format_size(bytes: u64) -> String {
    let mut exponent = 0;
    let mut scaled = bytes;
    while scaled >= 1000 && exponent < UNITS.len() - 1 {
        scaled /= 1000;
        exponent += 1;
    }

    if exponent == 0 {
        return format!("{} B", bytes);
    }

    let value = bytes as f64 / 1000f64.powi(exponent as i32);
    format!("{} {}", three_significant(value), UNITS[exponent])
}

/// Rounds a value in `[1, 1000)` to three significant digits and drops trailing zeros.
fn three_significant(value: f64) -> String {
    let decimals = if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    let rounded = format!("{:.*}", decimals, value);

    if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1000), "1 kB");
        assert_eq!(format_size(1500), "1.5 kB");
        assert_eq!(format_size(189_453), "189 kB");
        assert_eq!(format_size(5_242_880), "5.24 MB");
        assert_eq!(format_size(3_000_000_000), "3 GB");
    }
}
