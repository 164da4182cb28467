//! Wallpaper filter queries.
//!
//! A query is parsed once at startup into a small predicate tree and then
//! evaluated against each wallpaper during library assembly. The grammar:
//!
//! ```text
//! expr   := or
//! or     := and ( "or" and )*
//! and    := unary ( "and" unary )*
//! unary  := "not" unary | "(" expr ")" | atom
//! atom   := "tag:" WORD | ATTR OP VALUE
//! ATTR   := rating | purity | width | height | format
//! OP     := == | = | != | <= | >= | < | >
//! ```
//!
//! Numeric attributes compare against integers; `format` compares
//! case-insensitively against a word (only `==` and `!=` apply).

use std::fmt;

use crate::error::MuralError;
use crate::wallpaper::Wallpaper;

// ----------------------------------------------------------------------
// AST
// ----------------------------------------------------------------------

/// Wallpaper attributes a query may compare on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Rating,
    Purity,
    Width,
    Height,
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Compare {
        attribute: Attribute,
        comparison: Comparison,
        value: i64,
    },
    FormatIs {
        format: String,
        negated: bool,
    },
    HasTag(String),
    Not(Box<Query>),
    And(Box<Query>, Box<Query>),
    Or(Box<Query>, Box<Query>),
}

impl Query {
    /// Parses a query string.
    ///
    /// # Errors
    ///
    /// Returns [`MuralError::Query`] describing the first offending token.
    pub fn parse(input: &str) -> Result<Self, MuralError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, position: 0 };
        let query = parser.expr()?;
        match parser.peek() {
            None => Ok(query),
            Some(token) => Err(MuralError::Query(format!(
                "unexpected trailing input at `{token}`"
            ))),
        }
    }

    /// Evaluates the predicate against a wallpaper.
    #[must_use]
    pub fn matches(&self, wallpaper: &Wallpaper) -> bool {
        match self {
            Self::Compare { attribute, comparison, value } => {
                let actual = match attribute {
                    Attribute::Rating => i64::from(wallpaper.rating()),
                    Attribute::Purity => i64::from(wallpaper.purity()),
                    Attribute::Width => i64::from(wallpaper.width()),
                    Attribute::Height => i64::from(wallpaper.height()),
                    // Parser never produces Format here.
                    Attribute::Format => return false,
                };
                match comparison {
                    Comparison::Eq => actual == *value,
                    Comparison::Ne => actual != *value,
                    Comparison::Lt => actual < *value,
                    Comparison::Le => actual <= *value,
                    Comparison::Gt => actual > *value,
                    Comparison::Ge => actual >= *value,
                }
            }
            Self::FormatIs { format, negated } => {
                let matches = wallpaper.format().eq_ignore_ascii_case(format);
                matches != *negated
            }
            Self::HasTag(tag) => wallpaper.tags().contains(tag.as_str()),
            Self::Not(inner) => !inner.matches(wallpaper),
            Self::And(left, right) => left.matches(wallpaper) && right.matches(wallpaper),
            Self::Or(left, right) => left.matches(wallpaper) || right.matches(wallpaper),
        }
    }
}

// ----------------------------------------------------------------------
// Tokenizer
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Tag(String),
    Op(Comparison),
    Number(i64),
    OpenParen,
    CloseParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) => write!(f, "{word}"),
            Self::Tag(tag) => write!(f, "tag:{tag}"),
            Self::Op(op) => {
                let symbol = match op {
                    Comparison::Eq => "==",
                    Comparison::Ne => "!=",
                    Comparison::Lt => "<",
                    Comparison::Le => "<=",
                    Comparison::Gt => ">",
                    Comparison::Ge => ">=",
                };
                write!(f, "{symbol}")
            }
            Self::Number(number) => write!(f, "{number}"),
            Self::OpenParen => write!(f, "("),
            Self::CloseParen => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, MuralError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            ch if ch.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::OpenParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::CloseParen);
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.peek() == Some(&'=');
                if followed_by_eq {
                    chars.next();
                }
                let op = match (ch, followed_by_eq) {
                    // A bare `=` means equality too.
                    ('=', _) => Comparison::Eq,
                    ('!', true) => Comparison::Ne,
                    ('<', true) => Comparison::Le,
                    ('>', true) => Comparison::Ge,
                    ('<', false) => Comparison::Lt,
                    ('>', false) => Comparison::Gt,
                    _ => {
                        return Err(MuralError::Query(format!(
                            "incomplete operator `{ch}`"
                        )))
                    }
                };
                tokens.push(Token::Op(op));
            }
            ch if ch.is_ascii_digit() || ch == '-' => {
                let mut literal = String::new();
                literal.push(ch);
                chars.next();
                while let Some(&digit) = chars.peek() {
                    if !digit.is_ascii_digit() {
                        break;
                    }
                    literal.push(digit);
                    chars.next();
                }
                let number = literal.parse::<i64>().map_err(|_| {
                    MuralError::Query(format!("invalid number `{literal}`"))
                })?;
                tokens.push(Token::Number(number));
            }
            ch if ch.is_alphanumeric() || ch == '_' => {
                let mut word = String::new();
                while let Some(&letter) = chars.peek() {
                    if !(letter.is_alphanumeric() || letter == '_' || letter == '-') {
                        break;
                    }
                    word.push(letter);
                    chars.next();
                }
                if word == "tag" && chars.peek() == Some(&':') {
                    chars.next();
                    let mut tag = String::new();
                    while let Some(&letter) = chars.peek() {
                        if !(letter.is_alphanumeric() || letter == '_' || letter == '-') {
                            break;
                        }
                        tag.push(letter);
                        chars.next();
                    }
                    if tag.is_empty() {
                        return Err(MuralError::Query("empty tag name".to_string()));
                    }
                    tokens.push(Token::Tag(tag));
                } else {
                    tokens.push(Token::Word(word));
                }
            }
            other => {
                return Err(MuralError::Query(format!(
                    "unexpected character `{other}`"
                )))
            }
        }
    }

    Ok(tokens)
}

// ----------------------------------------------------------------------
// Parser
// ----------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Query, MuralError> {
        let mut left = self.and()?;
        while matches!(self.peek(), Some(Token::Word(word)) if word == "or") {
            self.next();
            let right = self.and()?;
            left = Query::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Query, MuralError> {
        let mut left = self.unary()?;
        while matches!(self.peek(), Some(Token::Word(word)) if word == "and") {
            self.next();
            let right = self.unary()?;
            left = Query::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Query, MuralError> {
        match self.peek() {
            Some(Token::Word(word)) if word == "not" => {
                self.next();
                Ok(Query::Not(Box::new(self.unary()?)))
            }
            Some(Token::OpenParen) => {
                self.next();
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::CloseParen) => Ok(inner),
                    _ => Err(MuralError::Query("missing `)`".to_string())),
                }
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Query, MuralError> {
        match self.next() {
            Some(Token::Tag(tag)) => Ok(Query::HasTag(tag)),
            Some(Token::Word(word)) => {
                let attribute = match word.as_str() {
                    "rating" => Attribute::Rating,
                    "purity" => Attribute::Purity,
                    "width" => Attribute::Width,
                    "height" => Attribute::Height,
                    "format" => Attribute::Format,
                    other => {
                        return Err(MuralError::Query(format!(
                            "unknown attribute `{other}`"
                        )))
                    }
                };
                let comparison = match self.next() {
                    Some(Token::Op(op)) => op,
                    other => {
                        return Err(MuralError::Query(format!(
                            "expected comparison after `{word}`, found {}",
                            other.map_or_else(|| "end of input".to_string(), |t| {
                                format!("`{t}`")
                            })
                        )))
                    }
                };
                if attribute == Attribute::Format {
                    let negated = match comparison {
                        Comparison::Eq => false,
                        Comparison::Ne => true,
                        _ => {
                            return Err(MuralError::Query(
                                "format only supports == and !=".to_string(),
                            ))
                        }
                    };
                    match self.next() {
                        Some(Token::Word(format)) => Ok(Query::FormatIs { format, negated }),
                        _ => Err(MuralError::Query(
                            "expected a format name".to_string(),
                        )),
                    }
                } else {
                    match self.next() {
                        Some(Token::Number(value)) => Ok(Query::Compare {
                            attribute,
                            comparison,
                            value,
                        }),
                        _ => Err(MuralError::Query(format!(
                            "expected a number after `{word}`"
                        ))),
                    }
                }
            }
            Some(token) => Err(MuralError::Query(format!(
                "unexpected token `{token}`"
            ))),
            None => Err(MuralError::Query("empty query".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn wallpaper(rating: i32, purity: i32, tags: &[&str]) -> Wallpaper {
        let wp = Wallpaper::new(
            "hash".to_string(),
            2560,
            1440,
            "JPEG".to_string(),
            vec![PathBuf::from("/w/a.jpg")],
        );
        wp.adjust_rating(rating);
        wp.adjust_purity(purity);
        for tag in tags {
            wp.toggle_tag(tag);
        }
        wp.clear_dirty();
        wp
    }

    #[test]
    fn test_simple_comparison() {
        let query = Query::parse("rating >= 2").unwrap();
        assert!(query.matches(&wallpaper(3, 0, &[])));
        assert!(query.matches(&wallpaper(2, 0, &[])));
        assert!(!query.matches(&wallpaper(1, 0, &[])));
    }

    #[test]
    fn test_all_operators() {
        assert!(Query::parse("rating == 1").unwrap().matches(&wallpaper(1, 0, &[])));
        assert!(Query::parse("rating = 1").unwrap().matches(&wallpaper(1, 0, &[])));
        assert!(Query::parse("rating != 1").unwrap().matches(&wallpaper(2, 0, &[])));
        assert!(Query::parse("rating < 0").unwrap().matches(&wallpaper(-1, 0, &[])));
        assert!(Query::parse("rating <= 0").unwrap().matches(&wallpaper(0, 0, &[])));
        assert!(Query::parse("rating > 4").unwrap().matches(&wallpaper(5, 0, &[])));
    }

    #[test]
    fn test_tag_atom() {
        let query = Query::parse("tag:nature").unwrap();
        assert!(query.matches(&wallpaper(0, 0, &["nature", "sky"])));
        assert!(!query.matches(&wallpaper(0, 0, &["city"])));
    }

    #[test]
    fn test_boolean_precedence_and_binds_tighter_than_or() {
        // a or b and c parses as a or (b and c)
        let query = Query::parse("rating >= 5 or rating >= 1 and tag:keep").unwrap();
        assert!(query.matches(&wallpaper(5, 0, &[])));
        assert!(query.matches(&wallpaper(1, 0, &["keep"])));
        assert!(!query.matches(&wallpaper(1, 0, &[])));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let query = Query::parse("(rating >= 5 or rating >= 1) and tag:keep").unwrap();
        assert!(!query.matches(&wallpaper(5, 0, &[])));
        assert!(query.matches(&wallpaper(5, 0, &["keep"])));
    }

    #[test]
    fn test_not() {
        let query = Query::parse("not tag:nsfw and purity >= 0").unwrap();
        assert!(query.matches(&wallpaper(0, 0, &[])));
        assert!(!query.matches(&wallpaper(0, 0, &["nsfw"])));
        assert!(!query.matches(&wallpaper(0, -1, &[])));
    }

    #[test]
    fn test_double_negation() {
        let query = Query::parse("not not tag:keep").unwrap();
        assert!(query.matches(&wallpaper(0, 0, &["keep"])));
        assert!(!query.matches(&wallpaper(0, 0, &[])));
    }

    #[test]
    fn test_dimension_attributes() {
        let query = Query::parse("width >= 1920 and height >= 1080").unwrap();
        assert!(query.matches(&wallpaper(0, 0, &[])));
    }

    #[test]
    fn test_format_matching_is_case_insensitive() {
        assert!(Query::parse("format == jpeg").unwrap().matches(&wallpaper(0, 0, &[])));
        assert!(Query::parse("format != png").unwrap().matches(&wallpaper(0, 0, &[])));
        assert!(!Query::parse("format == png").unwrap().matches(&wallpaper(0, 0, &[])));
    }

    #[test]
    fn test_negative_numbers() {
        let query = Query::parse("rating > -2").unwrap();
        assert!(query.matches(&wallpaper(-1, 0, &[])));
        assert!(!query.matches(&wallpaper(-2, 0, &[])));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Query::parse("").is_err());
        assert!(Query::parse("rating >").is_err());
        assert!(Query::parse("color == 3").is_err());
        assert!(Query::parse("rating == 3 extra").is_err());
        assert!(Query::parse("(rating == 3").is_err());
        assert!(Query::parse("tag:").is_err());
        assert!(Query::parse("format > jpeg").is_err());
        assert!(Query::parse("rating ? 3").is_err());
    }
}
