// src/ats/text.rs
//! Tokenizing and statement splitting shared by the sub-scorers

use super::vocabulary::{is_short_term, is_stop_word};

/// Characters that start a bullet line
pub const BULLET_GLYPHS: &[char] = &[
    '•', '◦', '▪', '▫', '■', '□', '●', '○', '➢', '➤', '►', '▶', '→', '✓', '✔', '✗', '★', '☆',
    '♦', '◆', '-', '*', '–', '—', '·',
];

/// Bullets every ATS parser handles
pub const PLAIN_BULLETS: &[char] = &['•', '-', '*'];

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '-')
}

/// Lowercased word tokens, stop-words and noise removed
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !is_token_char(c))
        .filter_map(|raw| {
            let token = raw
                .trim_matches(|c: char| c == '.' || c == '-')
                .to_lowercase();
            if token.is_empty() || is_stop_word(&token) {
                return None;
            }
            if token.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
                return None;
            }
            if token.chars().count() < 2 && !is_short_term(&token) {
                return None;
            }
            Some(token)
        })
        .collect()
}

/// Tokens that are worth treating as keywords of a job description
pub fn is_significant(token: &str) -> bool {
    token.chars().count() >= 3 || is_short_term(token)
}

/// Strip a leading bullet glyph and surrounding whitespace
pub fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_start_matches(BULLET_GLYPHS)
        .trim_start()
}

/// Leading bullet glyph of a line, if it has one
pub fn leading_bullet(line: &str) -> Option<char> {
    let first = line.trim_start().chars().next()?;
    BULLET_GLYPHS.contains(&first).then_some(first)
}

/// Split free text into statements: one per line, then per sentence.
pub fn statements(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = strip_bullet(line);
        if line.is_empty() {
            continue;
        }
        for sentence in split_sentences(line) {
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                out.push(sentence.to_string());
            }
        }
    }
    out
}

/// Sentence boundaries are '.', '!', '?' or ';' followed by whitespace.
/// Decimal points such as "2.5" never split.
fn split_sentences(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    for (i, &(pos, c)) in chars.iter().enumerate() {
        if matches!(c, '.' | '!' | '?' | ';') {
            let next_is_space = chars
                .get(i + 1)
                .map(|&(_, n)| n.is_whitespace())
                .unwrap_or(true);
            if next_is_space {
                parts.push(&line[start..pos]);
                start = pos + c.len_utf8();
            }
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }
    parts
}

/// First word of a statement with surrounding punctuation removed
pub fn first_word(statement: &str) -> Option<&str> {
    statement
        .split_whitespace()
        .next()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_technical_terms() {
        let tokens = tokenize("Experience with C++, C#, Node.js and the AWS cloud. 5 years");
        assert_eq!(tokens, vec!["c++", "c#", "node.js", "aws", "cloud"]);
    }

    #[test]
    fn test_tokenize_keeps_hyphenated_terms_whole() {
        assert_eq!(
            tokenize("Problem-solving - hands-on."),
            vec!["problem-solving", "hands-on"]
        );
    }

    #[test]
    fn test_tokenize_drops_numbers_and_single_letters() {
        assert!(tokenize("a 1 2.5 x").is_empty());
        assert_eq!(tokenize("R and Go"), vec!["r", "go"]);
    }

    #[test]
    fn test_statements_split_lines_and_sentences() {
        let text = "• Led the migration. Cut costs by 2.5%\n- Built tooling; shipped weekly";
        assert_eq!(
            statements(text),
            vec![
                "Led the migration",
                "Cut costs by 2.5%",
                "Built tooling",
                "shipped weekly"
            ]
        );
    }

    #[test]
    fn test_first_word_and_bullets() {
        assert_eq!(first_word("Led, a team"), Some("Led"));
        assert_eq!(leading_bullet("  ➢ item"), Some('➢'));
        assert_eq!(leading_bullet("item"), None);
        assert_eq!(strip_bullet("• item"), "item");
    }
}
