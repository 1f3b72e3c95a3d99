// src/core/sanitize.rs

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// First number in `text`, skipping any leading label such as `共`.
/// A `-` directly before the digits is kept; thousands separators are dropped.
pub fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let negative = text[..start].ends_with('-');
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .filter(|c| *c != ',')
        .collect();
    let value: f64 = digits.trim_end_matches('.').parse().ok()?;
    Some(if negative { -value } else { value })
}

/// First number in `text`, scaled by the Chinese unit that follows it.
/// `"16.7 万"` → 167000.0, `"共 1.2 亿"` → 120000000.0, `"61"` → 61.0.
pub fn parse_scaled(text: &str) -> Option<f64> {
    let value = first_number(text)?;
    let scale = if text.contains('亿') {
        100_000_000.0
    } else if text.contains('万') {
        10_000.0
    } else {
        1.0
    };
    Some(value * scale)
}

/// Split on full-width or ASCII colon and return the trimmed right-hand side.
/// `"提问时间：2024-01-06"` → `Some("2024-01-06")`.
pub fn after_colon(s: &str) -> Option<&str> {
    let idx = s.find('：').map(|i| i + '：'.len_utf8())
        .or_else(|| s.find(':').map(|i| i + 1))?;
    let rest = s[idx..].trim();
    if rest.is_empty() { None } else { Some(rest) }
}
