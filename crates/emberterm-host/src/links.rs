//! Link detection over rendered row text.
//!
//! Rows are scanned as plain text for URL and filesystem-path shapes. The
//! hit test answers modifier-clicks; actually opening the target is the
//! host's job.

/// A detected link: the column range it covers and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub start_col: u16,
    pub end_col: u16,
    pub text: String,
}

/// Characters that terminate a link token.
fn is_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '"' | '\'' | '<' | '>' | '(' | ')' | '[' | ']')
}

/// Trailing punctuation that reads as sentence structure, not link text.
fn trim_trailing(token: &str) -> &str {
    token.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

fn looks_like_link(token: &str) -> bool {
    if token.starts_with("http://") || token.starts_with("https://") {
        return token.len() > 8;
    }
    if token.starts_with("www.") {
        return token.len() > 4 && token[4..].contains('.');
    }
    // Unix-style absolute or home-relative paths with at least one segment.
    if (token.starts_with('/') || token.starts_with("~/")) && token.len() > 1 {
        return !token.contains("//");
    }
    // Windows drive paths.
    let bytes = token.as_bytes();
    if token.len() > 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && bytes[2] == b'\\'
    {
        return true;
    }
    false
}

/// Scan one row's text (one char per column) for link tokens.
#[must_use]
pub fn scan_row(text: &str) -> Vec<Link> {
    let chars: Vec<char> = text.chars().collect();
    let mut links = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if is_boundary(chars[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && !is_boundary(chars[i]) {
            i += 1;
        }
        let token: String = chars[start..i].iter().collect();
        let trimmed = trim_trailing(&token);
        if !trimmed.is_empty() && looks_like_link(trimmed) {
            links.push(Link {
                start_col: start as u16,
                end_col: (start + trimmed.chars().count() - 1) as u16,
                text: trimmed.to_string(),
            });
        }
    }
    links
}

/// The link covering `col`, if any.
#[must_use]
pub fn link_at(links: &[Link], col: u16) -> Option<&Link> {
    links
        .iter()
        .find(|l| col >= l.start_col && col <= l.end_col)
}
