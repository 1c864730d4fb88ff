/// Decimal places carried by every numeric column of the hourly table.
pub const OUTPUT_DECIMALS: u32 = 6;

/// Round `value` to `decimals` places, sending exact ties to the even digit.
///
/// # Examples
///
/// ```
/// use nem12_core::formatting::round_to;
///
/// assert_eq!(round_to(0.1234567, 6), 0.123457);
/// assert_eq!(round_to(-2.5, 0), -2.0);
/// assert_eq!(round_to(3.5, 0), 4.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Round to the output precision of the hourly table.
pub fn round6(value: f64) -> f64 {
    round_to(value, OUTPUT_DECIMALS)
}

/// Render `value` with exactly six decimals and no grouping, as written to CSV.
///
/// # Examples
///
/// ```
/// use nem12_core::formatting::format_fixed6;
///
/// assert_eq!(format_fixed6(6.0), "6.000000");
/// assert_eq!(format_fixed6(0.0416666), "0.041667");
/// ```
pub fn format_fixed6(value: f64) -> String {
    format!("{:.prec$}", value, prec = OUTPUT_DECIMALS as usize)
}

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use nem12_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact decimal midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Energy in kWh with one decimal, e.g. `"12,345.6 kWh"`.
pub fn format_energy(kwh: f64) -> String {
    format!("{} kWh", format_number(kwh, 1))
}

/// Power in kW with two decimals, e.g. `"2.35 kW"`.
pub fn format_power(kw: f64) -> String {
    format!("{} kW", format_number(kw, 2))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
