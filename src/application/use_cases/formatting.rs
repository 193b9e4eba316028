//! en-IN number formatting (lakh/crore grouping) and uptime labels.

/// Groups an integer digit string as `xx,xx,xxx`.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, last3) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), last3)
}

/// Two decimals with Indian grouping: `1234567.89` becomes `12,34,567.89`.
/// Missing or non-finite amounts render as `0.00`.
pub fn format_indian_currency(amount: Option<f64>) -> String {
    let amount = match amount {
        Some(value) if value.is_finite() => value,
        _ => return "0.00".to_string(),
    };
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, group_indian(int_part), dec_part)
}

/// Counts as shown on the cards: grouped, up to three decimals, trailing zeros dropped.
pub fn format_indian_number(value: Option<f64>) -> String {
    let value = match value {
        Some(value) if value.is_finite() => value,
        Some(_) => return "NaN".to_string(),
        None => return "0".to_string(),
    };
    let fixed = format!("{:.3}", value.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let dec_part = dec_part.trim_end_matches('0');
    let sign = if value < 0.0 && (int_part != "0" || !dec_part.is_empty()) {
        "-"
    } else {
        ""
    };
    if dec_part.is_empty() {
        format!("{}{}", sign, group_indian(int_part))
    } else {
        format!("{}{}.{}", sign, group_indian(int_part), dec_part)
    }
}

pub fn format_count(value: u64) -> String {
    group_indian(&value.to_string())
}

/// `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_uses_lakh_grouping() {
        assert_eq!(format_indian_currency(Some(1234567.89)), "12,34,567.89");
        assert_eq!(format_indian_currency(Some(123456789.5)), "12,34,56,789.50");
        assert_eq!(format_indian_currency(Some(999.0)), "999.00");
        assert_eq!(format_indian_currency(Some(1000.0)), "1,000.00");
        assert_eq!(format_indian_currency(Some(-25000.456)), "-25,000.46");
    }

    #[test]
    fn currency_defaults_to_zero() {
        assert_eq!(format_indian_currency(None), "0.00");
        assert_eq!(format_indian_currency(Some(f64::NAN)), "0.00");
    }

    #[test]
    fn numbers_group_like_en_in() {
        assert_eq!(format_indian_number(None), "0");
        assert_eq!(format_indian_number(Some(0.0)), "0");
        assert_eq!(format_indian_number(Some(1500000.0)), "15,00,000");
        assert_eq!(format_indian_number(Some(1234.5)), "1,234.5");
        assert_eq!(format_count(98765), "98,765");
    }

    #[test]
    fn uptime_drops_leading_zero_units() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(59), "59s");
        assert_eq!(format_uptime(61), "1m 1s");
        assert_eq!(format_uptime(3600), "1h 0m 0s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
    }
}
