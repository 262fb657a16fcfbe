/// Snippet extraction for search results: sanitize the content, center a
/// byte window on the first query-term hit and highlight every term
/// occurrence with 【 and 】.

/// Codepoints that survive sanitation: printable ASCII and common
/// whitespace, CJK ideographs (base + extension A), CJK punctuation,
/// halfwidth/fullwidth forms and the Latin-1 supplement.
fn is_allowed(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{7e}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{3000}'..='\u{303f}'
        | '\u{ff00}'..='\u{ffef}'
        | '\u{a0}'..='\u{ff}')
}

pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect()
}

/// Extract up to `max_length` bytes centered on the first term occurrence,
/// snapping window edges to UTF-8 character boundaries, with `...` marking
/// clipped edges.
pub fn generate(content: &str, terms: &[String], max_length: usize) -> String {
    if content.is_empty() {
        return String::new();
    }

    let clean = sanitize(content);
    let lower = clean.to_ascii_lowercase();

    let mut best_pos = 0usize;
    for term in terms {
        if let Some(pos) = lower.find(&term.to_ascii_lowercase()) {
            best_pos = pos;
            break;
        }
    }

    let mut start = if best_pos > max_length / 2 {
        best_pos - max_length / 2
    } else {
        0
    };
    while start > 0 && !clean.is_char_boundary(start) {
        start -= 1;
    }

    let mut end = (start + max_length).min(clean.len());
    while !clean.is_char_boundary(end) {
        end -= 1;
    }

    let mut summary = String::new();
    if start > 0 {
        summary.push_str("...");
    }
    summary.push_str(&clean[start..end]);
    if end < clean.len() {
        summary.push_str("...");
    }

    highlight(&summary, terms)
}

/// Wrap each term occurrence in 【 and 】. The search is ASCII
/// case-insensitive and the replacement preserves the original casing.
pub fn highlight(text: &str, terms: &[String]) -> String {
    let mut result = text.to_string();

    for term in terms {
        if term.is_empty() {
            continue;
        }
        let needle = term.to_ascii_lowercase();
        let lower = result.to_ascii_lowercase();

        let mut highlighted = String::with_capacity(result.len());
        let mut cursor = 0usize;
        while let Some(found) = lower[cursor..].find(&needle) {
            let start = cursor + found;
            let end = start + needle.len();
            highlighted.push_str(&result[cursor..start]);
            highlighted.push('【');
            highlighted.push_str(&result[start..end]);
            highlighted.push('】');
            cursor = end;
        }
        highlighted.push_str(&result[cursor..]);
        result = highlighted;
    }

    result
}
