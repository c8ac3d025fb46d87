/// Currency symbol for amounts from the backend, which are all in naira.
pub const CURRENCY_SYMBOL: &str = "₦";

/// Group the integer digits of `digits` in threes: "1234567" -> "1,234,567"
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Format an amount with thousands separators and two decimals.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(whole), fraction)
}

/// Format an amount as naira, e.g. `₦12,500.00`
pub fn format_currency(amount: f64) -> String {
    let formatted = format_amount(amount);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-{}{}", CURRENCY_SYMBOL, rest),
        None => format!("{}{}", CURRENCY_SYMBOL, formatted),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    // Try to parse ISO format and convert to readable
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

/// Format an optional date, returning a default if None
pub fn format_optional_date(date: Option<&str>, default: &str) -> String {
    date.map(format_date).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.0), "999.00");
        assert_eq!(format_amount(1500.5), "1,500.50");
        assert_eq!(format_amount(1234567.0), "1,234,567.00");
        assert_eq!(format_amount(-2500.0), "-2,500.00");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(5000.0), "₦5,000.00");
        assert_eq!(format_currency(-10.0), "-₦10.00");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("₦₦₦₦₦", 4), "₦...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-05T10:00:00Z"), "Mar 05, 2024");
        assert_eq!(format_date("2024-03-05T10:00:00.123456"), "Mar 05, 2024");
        assert_eq!(format_date("2024-03-05"), "2024-03-05");
        assert_eq!(format_date("soon"), "soon");
        assert_eq!(format_optional_date(None, "-"), "-");
    }
}
