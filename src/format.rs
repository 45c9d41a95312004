/// Format an amount as euros with Dutch separators
///
/// Thousands are grouped with `.` and two decimals follow a `,`.
/// Zero and NaN render as `€ 0`.
///
/// # Examples
/// ```
/// use asset_dashboard::format::format_euro;
///
/// assert_eq!(format_euro(0.0), "€ 0");
/// assert_eq!(format_euro(1234.5), "€ 1.234,50");
/// ```
pub fn format_euro(value: f64) -> String {
    if value.is_nan() || value == 0.0 {
        return "€ 0".to_string();
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("€ {}inf", sign);
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };

    format!("€ {}{},{}", sign, group_thousands(int_part), frac_part)
}

/// Period label used in the timeline, e.g. `25 jaar`
pub fn format_period(jaren: u32) -> String {
    format!("{} jaar", jaren)
}

/// Factor as shown in the editable grid
pub fn format_factor(factor: f64) -> String {
    format!("{:.2}", factor)
}

/// Round to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    grouped
}
