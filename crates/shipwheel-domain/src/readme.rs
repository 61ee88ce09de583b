//! Markdown to reStructuredText conversion for package-index readmes.
//!
//! Line-based, deterministic, and intentionally limited to the constructs a
//! typical project readme uses: ATX headings, bullet and numbered lists,
//! fenced code blocks, inline code, emphasis, links, images, block quotes,
//! and horizontal rules. Everything else passes through unchanged.

const HEADING_UNDERLINES: [char; 6] = ['=', '-', '~', '^', '"', '\''];

/// Converts a Markdown document to reStructuredText.
#[must_use]
pub fn markdown_to_rst(markdown: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut in_code_block = false;
    let mut prev_was_list = false;

    for line in markdown.lines() {
        if in_code_block {
            if is_code_fence(line.trim()) {
                in_code_block = false;
                push_blank(&mut out);
            } else if line.trim().is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("   {line}"));
            }
            continue;
        }

        let trimmed = line.trim_start();

        if is_code_fence(trimmed) {
            let lang = trimmed.trim_start_matches('`').trim();
            let lang = if lang.is_empty() { "text" } else { lang };
            ensure_blank(&mut out);
            out.push(format!(".. code-block:: {lang}"));
            out.push(String::new());
            in_code_block = true;
            prev_was_list = false;
            continue;
        }

        if let Some((level, title)) = parse_heading(trimmed) {
            let title = convert_inline(title);
            let underline_char = HEADING_UNDERLINES[level - 1];
            ensure_blank(&mut out);
            out.push(title.clone());
            out.push(underline_char.to_string().repeat(title.chars().count().max(1)));
            prev_was_list = false;
            continue;
        }

        if is_horizontal_rule(trimmed) {
            ensure_blank(&mut out);
            out.push("----".to_string());
            prev_was_list = false;
            continue;
        }

        if let Some((alt, url)) = parse_image_only(trimmed) {
            ensure_blank(&mut out);
            out.push(format!(".. image:: {url}"));
            if !alt.is_empty() {
                out.push(format!("   :alt: {alt}"));
            }
            prev_was_list = false;
            continue;
        }

        if let Some((indent, marker, rest)) = parse_list_item(line) {
            if !prev_was_list {
                ensure_blank(&mut out);
            }
            out.push(format!("{indent}{marker} {}", convert_inline(rest)));
            prev_was_list = true;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            ensure_blank(&mut out);
            out.push(format!("   {}", convert_inline(rest.trim_start())));
            prev_was_list = false;
            continue;
        }

        if line.trim().is_empty() {
            out.push(String::new());
            prev_was_list = false;
        } else if prev_was_list && line.starts_with(' ') {
            // continuation line of a list item
            out.push(convert_inline(line));
        } else {
            out.push(convert_inline(line));
            prev_was_list = false;
        }
    }

    let mut body = out.join("\n");
    while body.ends_with('\n') {
        body.pop();
    }
    body.push('\n');
    body
}

fn is_code_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```")
}

fn parse_heading(trimmed: &str) -> Option<(usize, &str)> {
    let level = trimmed.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    let rest = rest.strip_prefix(' ')?;
    let title = rest.trim_end_matches(['#', ' ']);
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

fn is_horizontal_rule(trimmed: &str) -> bool {
    let chars: Vec<char> = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    chars.len() >= 3
        && (chars.iter().all(|&c| c == '-')
            || chars.iter().all(|&c| c == '*')
            || chars.iter().all(|&c| c == '_'))
}

/// Recognizes `- item`, `* item`, `+ item`, and `1. item` / `1) item`.
/// Returns the leading indent, the rst marker, and the item text.
fn parse_list_item(line: &str) -> Option<(&str, String, &str)> {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);
    if let Some(item) = rest
        .strip_prefix("- ")
        .or_else(|| rest.strip_prefix("* "))
        .or_else(|| rest.strip_prefix("+ "))
    {
        return Some((indent, "-".to_string(), item));
    }
    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = &rest[digits..];
        if let Some(item) = after
            .strip_prefix(". ")
            .or_else(|| after.strip_prefix(") "))
        {
            return Some((indent, format!("{}.", &rest[..digits]), item));
        }
    }
    None
}

fn parse_image_only(trimmed: &str) -> Option<(String, String)> {
    let rest = trimmed.strip_prefix("![")?;
    let close = rest.find(']')?;
    let alt = &rest[..close];
    let after = rest[close + 1..].strip_prefix('(')?;
    let end = after.find(')')?;
    if !after[end + 1..].trim().is_empty() {
        return None;
    }
    Some((alt.to_string(), after[..end].to_string()))
}

/// Rewrites inline spans: code spans get rst double backticks and links
/// become embedded-URI references. Emphasis markers are shared between the
/// two dialects and pass through.
fn convert_inline(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let (before, after) = rest.split_at(start);
        out.push_str(&convert_links(before));
        let run = after.chars().take_while(|&c| c == '`').count();
        let delim = &after[..run];
        match after[run..].find(delim) {
            Some(end) => {
                out.push_str("``");
                out.push_str(&after[run..run + end]);
                out.push_str("``");
                rest = &after[run + end + run..];
            }
            None => {
                // unbalanced backtick, leave the remainder untouched
                out.push_str(&convert_links(after));
                rest = "";
            }
        }
    }
    out.push_str(&convert_links(rest));
    out
}

fn convert_links(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '[' {
            if let Some((label, url, next)) = parse_link(&chars, i) {
                if out.ends_with('!') {
                    out.pop();
                }
                out.push('`');
                out.push_str(&label);
                out.push_str(" <");
                out.push_str(&url);
                out.push_str(">`_");
                i = next;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn parse_link(chars: &[char], open: usize) -> Option<(String, String, usize)> {
    let close = chars[open + 1..].iter().position(|&c| c == ']')? + open + 1;
    if chars.get(close + 1) != Some(&'(') {
        return None;
    }
    let end = chars[close + 2..].iter().position(|&c| c == ')')? + close + 2;
    let label: String = chars[open + 1..close].iter().collect();
    let url: String = chars[close + 2..end].iter().collect();
    if label.is_empty() || url.is_empty() {
        return None;
    }
    Some((label, url, end + 1))
}

fn ensure_blank(out: &mut Vec<String>) {
    if out.last().is_some_and(|line| !line.is_empty()) {
        out.push(String::new());
    }
}

fn push_blank(out: &mut Vec<String>) {
    if out.last().is_none_or(|line| !line.is_empty()) {
        out.push(String::new());
    }
}
