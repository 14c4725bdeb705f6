//! Re-encoding of filter LIKE patterns into SQL LIKE syntax.
//!
//! Filter patterns come with their own wildcard, single-char and escape
//! characters. Translation maps them onto `%`, `_` and the dialect's escape
//! character, escaping any SQL specials that occur literally in the pattern.

const SQL_WILDCARD: char = '%';
const SQL_SINGLE_CHAR: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Wildcard,
    SingleChar,
    Literal(char),
}

/// A LIKE pattern parsed against its wildcard/single-char/escape convention.
#[derive(Debug, Clone)]
pub struct LikePattern {
    tokens: Vec<Token>,
}

impl LikePattern {
    pub fn parse(pattern: &str, wildcard: char, single_char: char, escape_char: char) -> LikePattern {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c == escape_char {
                // An escaped character is literal; a trailing escape char
                // stands for itself.
                tokens.push(Token::Literal(chars.next().unwrap_or(escape_char)));
            } else if c == wildcard {
                tokens.push(Token::Wildcard);
            } else if c == single_char {
                tokens.push(Token::SingleChar);
            } else {
                tokens.push(Token::Literal(c));
            }
        }
        LikePattern { tokens }
    }

    /// Renders the pattern in SQL LIKE syntax. `lower_case` folds literal
    /// text for case-insensitive matching; `sql_escape` is the dialect's
    /// LIKE escape character.
    pub fn to_sql(&self, lower_case: bool, sql_escape: char) -> String {
        let mut out = String::with_capacity(self.tokens.len() + 4);
        for token in &self.tokens {
            match token {
                Token::Wildcard => out.push(SQL_WILDCARD),
                Token::SingleChar => out.push(SQL_SINGLE_CHAR),
                Token::Literal(c) => {
                    if *c == SQL_WILDCARD || *c == SQL_SINGLE_CHAR || *c == sql_escape {
                        out.push(sql_escape);
                    }
                    if lower_case {
                        out.extend(c.to_lowercase());
                    } else {
                        out.push(*c);
                    }
                }
            }
        }
        out
    }
}

/// Escapes a plain literal so that it matches itself when fed through
/// [`LikePattern::parse`] with the `* ? \` convention. Used to rewrite
/// equality against concatenated columns as a LIKE test.
pub fn escape_literal(value: &str, wildcard: char, single_char: char, escape_char: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == wildcard || c == single_char || c == escape_char {
            out.push(escape_char);
        }
        out.push(c);
    }
    out
}

/// Wraps an encoded pattern so it matches exactly one entry of a
/// `|`-delimited concatenated column.
pub fn wrap_concatenated(encoded: &str) -> String {
    format!("%|{encoded}|%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_filter_wildcards_to_sql() {
        let pattern = LikePattern::parse("Mai*stra?e", '*', '?', '\\');
        assert_eq!(pattern.to_sql(false, '\\'), "Mai%stra_e");
    }

    #[test]
    fn escapes_sql_specials_in_literal_text() {
        let pattern = LikePattern::parse("100%_done", '*', '?', '\\');
        assert_eq!(pattern.to_sql(false, '\\'), "100\\%\\_done");
    }

    #[test]
    fn escaped_input_chars_become_literal() {
        let pattern = LikePattern::parse(r"a\*b", '*', '?', '\\');
        assert_eq!(pattern.to_sql(false, '\\'), "a*b");
    }

    #[test]
    fn lower_case_folds_only_literal_text() {
        let pattern = LikePattern::parse("AB*", '*', '?', '\\');
        assert_eq!(pattern.to_sql(true, '\\'), "ab%");
    }

    #[test]
    fn escape_literal_round_trips_through_parse() {
        let escaped = escape_literal(r"a*b?c\d", '*', '?', '\\');
        assert_eq!(escaped, r"a\*b\?c\\d");
        let pattern = LikePattern::parse(&escaped, '*', '?', '\\');
        assert_eq!(pattern.to_sql(false, '\\'), r"a*b?c\\d");
    }

    #[test]
    fn concatenated_wrapping() {
        assert_eq!(wrap_concatenated("x"), "%|x|%");
    }
}
