/// Attribute number formatting: shortest round-trip decimal, no `-0`, float noise snapped.
pub(crate) fn fmt(v: f64) -> String {
    if !v.is_finite() || v.abs() < 1e-9 {
        return "0".to_string();
    }
    let nearest = v.round();
    let v = if (v - nearest).abs() < 1e-6 { nearest } else { v };
    // `-0.0 + 0.0` is `0.0`.
    format!("{}", v + 0.0)
}

/// Path data uses at most three fractional digits, rounded half-up.
pub(crate) fn fmt_path(v: f64) -> String {
    let milli = (v * 1000.0 + 0.5).floor();
    if !v.is_finite() || milli == 0.0 {
        return "0".to_string();
    }
    let milli = milli as i64;
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.unsigned_abs();
    match abs % 1000 {
        0 => format!("{sign}{}", abs / 1000),
        frac => {
            let digits = format!("{frac:03}");
            format!("{sign}{}.{}", abs / 1000, digits.trim_end_matches('0'))
        }
    }
}

/// Escapes text for both element content and double-quoted attributes.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
