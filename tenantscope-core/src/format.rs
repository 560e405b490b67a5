//! Formatting helpers shared by the presentation layers.

use crate::analytics::MetricDelta;

/// Integer with thousands separators (e.g., "12,345").
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Weight or average with one decimal and thousands separators.
pub fn format_weight(value: f64) -> String {
    if !value.is_finite() {
        return "0.0".to_string();
    }
    let rounded = (value.abs() * 10.0).round() as u64;
    let sign = if value < 0.0 && rounded > 0 { "-" } else { "" };
    format!("{}{}.{}", sign, format_count(rounded / 10), rounded % 10)
}

/// Percentage with one decimal (e.g., "42.5%").
pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}%", value)
    } else {
        "0.0%".to_string()
    }
}

/// Signed change with a direction arrow (e.g., "▲ 12.5%", "▼ 3.0%").
///
/// Zero change renders without an arrow.
pub fn format_change(percent_change: f64) -> String {
    if !percent_change.is_finite() || percent_change == 0.0 {
        "0.0%".to_string()
    } else if percent_change > 0.0 {
        format!("▲ {:.1}%", percent_change)
    } else {
        format!("▼ {:.1}%", percent_change.abs())
    }
}

/// Current value followed by its change, e.g. "1,204 (▲ 8.1%)".
pub fn format_delta_count(delta: &MetricDelta) -> String {
    format!(
        "{} ({})",
        format_count(delta.current.max(0.0).round() as u64),
        format_change(delta.percent_change)
    )
}

/// Duration given in hours as "Nd Nh Nm Ns", leading zero units omitted.
pub fn format_duration_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0s".to_string();
    }
    let total_secs = (hours * 3600.0).round() as u64;
    let days = total_secs / 86_400;
    let hrs = (total_secs % 86_400) / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    let parts: Vec<String> = [(days, "d"), (hrs, "h"), (mins, "m"), (secs, "s")]
        .iter()
        .skip_while(|(n, _)| *n == 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
