//! Reading the `prob_pointing` token back out of a log line.

use std::sync::LazyLock;

use regex::Regex;

/// Key of the probability token, as written in every record line.
pub const PROB_POINTING_KEY: &str = "prob_pointing";

/// `prob_pointing=` followed by an optionally signed decimal, optional exponent.
static PROB_POINTING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"prob_pointing=([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("valid regex")
});

/// Extract the probability from a line, if it carries a well-formed token.
///
/// The first token matching the number grammar is used. The number must end at a
/// delimiter (whitespace, `,`, `;`, `]`, `)` or end of line): `0.75abc` and
/// `0.1.2` are treated as malformed and yield `None`, as does a missing token.
pub fn parse_prob_pointing(line: &str) -> Option<f64> {
    let caps = PROB_POINTING_TOKEN.captures(line)?;
    let number = caps.get(1)?;

    let rest = &line[number.end()..];
    if let Some(next) = rest.chars().next() {
        if !(next.is_whitespace() || matches!(next, ',' | ';' | ']' | ')')) {
            return None;
        }
    }

    let value: f64 = number.as_str().parse().ok()?;
    value.is_finite().then_some(value)
}
