//! Formatting utilities for CLI output.
//!
//! Provides consistent formatting for bytes, time, and text truncation.

/// Format bytes as a human-readable string (KB, MB, GB).
///
/// # Examples
///
/// ```
/// use reelforge_cli::ui::format::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1024), "1.0 KB");
/// assert_eq!(format_bytes(1_500_000), "1.4 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Truncate a string to a maximum length with ellipsis.
///
/// If the string is longer than `max_len`, it is truncated and `...` is appended.
/// The total output length will be exactly `max_len` characters.
///
/// # Examples
///
/// ```
/// use reelforge_cli::ui::format::truncate_str;
///
/// assert_eq!(truncate_str("hello", 10), "hello");
/// assert_eq!(truncate_str("hello world", 8), "hello...");
/// ```
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        // Handle Unicode properly by using char indices
        let mut end = 0;
        for (i, (idx, _)) in s.char_indices().enumerate() {
            if i >= max_len - 3 {
                break;
            }
            end = idx;
        }
        // Get the next char boundary
        let truncate_at = s[end..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| end + i)
            .unwrap_or(end);
        format!("{}...", &s[..truncate_at])
    }
}

/// Format a number with thousands separators.
///
/// # Examples
///
/// ```
/// use reelforge_cli::ui::format::format_thousands;
///
/// assert_eq!(format_thousands(1000), "1,000");
/// assert_eq!(format_thousands(1234567), "1,234,567");
/// ```
pub fn format_thousands(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    for (i, c) in chars.into_iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}
