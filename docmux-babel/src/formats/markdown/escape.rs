//! Markdown escaping and fence sizing

/// Escape characters that would otherwise start Markdown syntax
///
/// Covers emphasis, strikethrough, links, code, tables, raw HTML, math, and
/// the block markers that only count at the start of a line: `#`, `>`, list
/// bullets, ordered-list numbers and setext underlines.
pub fn escape_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + text.len() / 10);
    let mut at_line_start = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '|' | '<' | '~' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '#' | '>' if at_line_start => {
                out.push('\\');
                out.push(c);
            }
            // Bullets, and the dash or equals runs of breaks and setext underlines
            '-' | '+' | '=' if at_line_start && (ends_marker(next) || next == Some(c)) => {
                out.push('\\');
                out.push(c);
            }
            '0'..='9' if at_line_start => {
                let digits = chars[i..].iter().take_while(|d| d.is_ascii_digit()).count();
                let after = chars.get(i + digits).copied();
                out.extend(&chars[i..i + digits]);
                i += digits;
                if digits <= 9
                    && matches!(after, Some('.') | Some(')'))
                    && ends_marker(chars.get(i + 1).copied())
                {
                    out.push('\\');
                    out.push(chars[i]);
                    i += 1;
                }
                at_line_start = false;
                continue;
            }
            '!' if next == Some('[') => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
        at_line_start = c == '\n' || (at_line_start && c == ' ');
        i += 1;
    }

    out
}

// A list marker needs whitespace or the end of the line after it
fn ends_marker(next: Option<char>) -> bool {
    matches!(next, None | Some(' ') | Some('\t') | Some('\n'))
}

/// Smallest fence (at least 3) longer than any run of `fence` in `content`
pub fn fence_length(content: &str, fence: char) -> usize {
    longest_run(content, fence).max(2) + 1
}

/// Smallest backtick count not appearing as a run in `content`
pub fn inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Link destination, wrapped in `<>` when it holds spaces or parentheses
pub fn destination(url: &str) -> String {
    if url.is_empty() {
        return "<>".to_string();
    }
    if url.contains([' ', '(', ')', '<', '>']) {
        let escaped = url.replace('<', "%3C").replace('>', "%3E");
        format!("<{}>", escaped)
    } else {
        url.to_string()
    }
}

/// ` "title"` suffix for links and images, or nothing
pub fn title(title: Option<&str>) -> String {
    match title {
        Some(t) if !t.is_empty() => format!(" \"{}\"", t.replace('\\', "\\\\").replace('"', "\\\"")),
        _ => String::new(),
    }
}
