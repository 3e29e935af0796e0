use chrono::NaiveDate;

/// Format a provider date ("2026-03-01" or "2026-03") for display
pub fn format_date(date: &str) -> String {
    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        day.format("%d %b %Y").to_string()
    } else if let Ok(month) = NaiveDate::parse_from_str(&format!("{}-01", date), "%Y-%m-%d") {
        month.format("%b %Y").to_string()
    } else {
        date.to_string()
    }
}

/// Group digits in threes: 1850 -> "1,850"
pub fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_engine_capacity(cc: u32) -> String {
    format!("{} cc", format_thousands(cc))
}

pub fn format_co2(grams_per_km: u32) -> String {
    format!("{} g/km", grams_per_km)
}

pub fn format_weight(kg: u32) -> String {
    format!("{} kg", format_thousands(kg))
}

/// Human-readable byte count
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let size = bytes as f64;
    if size >= MB {
        format!("{:.1} MB", size / MB)
    } else if size >= KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Yes/No for provider booleans
pub fn format_flag(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
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
