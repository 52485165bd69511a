use arbor_core::TextProperties;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

/// Marker appended to labels cut down to `maxAllowedWidth`.
pub const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 12.0,
            font_weight: None,
            font_style: None,
        }
    }
}

impl TextStyle {
    pub fn from_properties(props: &TextProperties) -> Self {
        fn non_empty(s: &str) -> Option<String> {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Self {
            font_family: non_empty(&props.font_family),
            font_size: props.font_size.max(1.0),
            font_weight: non_empty(&props.font_weight),
            font_style: non_empty(&props.font_style),
        }
    }

    fn is_bold(&self) -> bool {
        match self.font_weight.as_deref() {
            Some("bold" | "bolder") => true,
            Some(w) => w.parse::<u32>().is_ok_and(|w| w >= 600),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Font-free measurer: every terminal column costs `char_width_factor` em.
///
/// Wide (CJK) glyphs count as two columns, zero-width marks as none.
#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    fn line_columns(line: &str) -> usize {
        line.chars().map(|c| c.width().unwrap_or(0)).sum()
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let char_width_factor = if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        };
        let line_height_factor = if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        };
        let bold = if style.is_bold() { 1.1 } else { 1.0 };

        let font_size = style.font_size.max(1.0);
        let mut line_count = 0usize;
        let mut max_cols = 0usize;
        for line in text.split('\n') {
            line_count += 1;
            max_cols = max_cols.max(Self::line_columns(line));
        }

        TextMetrics {
            width: max_cols as f64 * font_size * char_width_factor * bold,
            height: line_count as f64 * font_size * line_height_factor,
            line_count,
        }
    }
}

/// Cuts `text` to the longest prefix that still fits `max_width` once [`ELLIPSIS`] is
/// appended. Text that already fits is returned unchanged.
///
/// Assumes measured width grows with prefix length, which holds for any measurer that sums
/// per-glyph advances.
pub fn truncate_to_width(
    measurer: &dyn TextMeasurer,
    text: &str,
    style: &TextStyle,
    max_width: f64,
) -> String {
    if measurer.measure(text, style).width <= max_width {
        return text.to_string();
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let fits = |chars: usize| {
        let candidate = format!("{}{ELLIPSIS}", text[..boundaries[chars]].trim_end());
        measurer.measure(&candidate, style).width <= max_width
    };

    // Largest `n` in `0..char_count` with `fits(n)`; `lo` always fits or is zero.
    let (mut lo, mut hi) = (0usize, boundaries.len() - 1);
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    if lo == 0 && !fits(0) {
        // Not even the marker fits; keep as much of it as the budget allows.
        let mut marker = ELLIPSIS.to_string();
        while !marker.is_empty() && measurer.measure(&marker, style).width > max_width {
            marker.pop();
        }
        return marker;
    }
    format!("{}{ELLIPSIS}", text[..boundaries[lo]].trim_end())
}
