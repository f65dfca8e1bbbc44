use std::sync::OnceLock;

use regex::Regex;

pub fn sanitize_text(text: &str) -> String {
    static SANITIZE_TEXT_REGEXP: OnceLock<Regex> = OnceLock::new();
    let re = SANITIZE_TEXT_REGEXP.get_or_init(|| Regex::new(r#"[\n\t\s]+"#).unwrap());

    re.replace_all(text, " ").trim().to_owned()
}

pub fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// "the dark knight" -> "the-dark-knight"
pub fn dash_separated(text: &str) -> String {
    static WHITESPACE_REGEXP: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE_REGEXP.get_or_init(|| Regex::new(r#"\s+"#).unwrap());

    re.replace_all(text, "-").into_owned()
}

/// Leading decimal digits of `text`, ignoring leading whitespace.
pub fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

/// Last path segment without query string: ".../e-1/AbC?z=1" -> "AbC".
pub fn last_path_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_sanitize_text() {
        assert_eq!(sanitize_text("  a\n\t b  c "), "a b c");
    }

    #[test]
    fn should_dash_separate() {
        assert_eq!(dash_separated("the  dark\tknight"), "the-dark-knight");
    }

    #[test]
    fn should_read_leading_number() {
        assert_eq!(leading_number("12"), Some(12));
        assert_eq!(leading_number(" 3 extra"), Some(3));
        assert_eq!(leading_number("Special"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn should_extract_last_path_segment() {
        assert_eq!(
            last_path_segment("https://videostr.net/embed-1/v2/e-1/AbC123?z="),
            Some("AbC123")
        );
        assert_eq!(last_path_segment("https://host/movie/slug-1/"), Some("slug-1"));
        assert_eq!(last_path_segment("/movie/the-matrix-19995"), Some("the-matrix-19995"));
        assert_eq!(last_path_segment(""), None);
    }
}
