//! Output formatting helpers for terminal display.

use swapmeet_core::models::User;

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

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Format a timestamp as a short date
pub fn format_date(date: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    match date {
        Some(dt) => dt.format("%b %d, %Y").to_string(),
        None => "-".to_string(),
    }
}

/// Format a decimal amount string as rupees, e.g. "250.5" -> "₹250.50"
pub fn format_value(value: Option<&str>) -> String {
    match value.map(str::trim) {
        None | Some("") => "-".to_string(),
        Some(raw) => match raw.parse::<f64>() {
            Ok(amount) => format!("₹{:.2}", amount),
            Err(_) => raw.to_string(),
        },
    }
}

/// One-line trust summary: score, completed swaps, and badges
pub fn format_trust(user: &User) -> String {
    let score = match (user.trust(), user.trust_score.as_deref()) {
        (Some(score), _) => format!("{:.2}", score),
        (None, Some(raw)) if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => "n/a".to_string(),
    };
    let mut line = format!("trust {} | {} swaps", score, user.total_swaps);
    if user.is_verified {
        line.push_str(" | verified");
    }
    if !user.badges.is_empty() {
        let badges: Vec<String> = user.badges.iter().map(|b| b.replace('_', " ")).collect();
        line.push_str(&format!(" | {}", badges.join(", ")));
    }
    line
}
