//! Lexer for the proto language using logos.
//!
//! Line comments are produced as tokens (not skipped) so the parser can
//! attach them to the following field declaration; block comments are
//! discarded here.

use logos::Logos;

/// Token types for the proto language.
///
/// Scalar type names (`int32`, `bytes`, ...) are not keywords; they lex as
/// identifiers and are classified by the parser.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"/\*([^*]|\*[^/])*\*+/")]
pub enum Token {
    // Keywords
    #[token("syntax")]
    Syntax,

    #[token("package")]
    Package,

    #[token("import")]
    Import,

    #[token("public")]
    Public,

    #[token("weak")]
    Weak,

    #[token("message")]
    Message,

    #[token("enum")]
    Enum,

    #[token("service")]
    Service,

    #[token("rpc")]
    Rpc,

    #[token("returns")]
    Returns,

    #[token("stream")]
    Stream,

    #[token("repeated")]
    Repeated,

    #[token("optional")]
    Optional,

    #[token("required")]
    Required,

    #[token("oneof")]
    Oneof,

    #[token("map")]
    Map,

    #[token("option")]
    OptionKw,

    #[token("reserved")]
    Reserved,

    // Symbols
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("<")]
    LAngle,

    #[token(">")]
    RAngle,

    #[token(";")]
    Semi,

    #[token(",")]
    Comma,

    #[token("=")]
    Eq,

    #[token(".")]
    Dot,

    #[token(":")]
    Colon,

    #[token("-")]
    Minus,

    #[token("+")]
    Plus,

    // String literals
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        // Remove quotes (escape sequences are kept verbatim; import paths
        // and syntax levels do not use them)
        s[1..s.len()-1].to_string()
    })]
    StringLiteral(std::string::String),

    // Integer literals (decimal or hex)
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| i64::from_str_radix(&lex.slice()[2..], 16).ok())]
    IntLiteral(i64),

    // Float literals only appear inside option values, which are skipped
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(std::string::String),

    // Line comments, with the `//` and surrounding whitespace stripped
    #[regex(r"//[^\n]*", |lex| lex.slice()[2..].trim().to_string())]
    Comment(std::string::String),
}

/// A token with its span information.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Lexer wrapper that provides iteration over spanned tokens.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Result<SpannedToken, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.inner.next()?;
        let span = self.inner.span();

        match token {
            Ok(token) => Some(Ok(SpannedToken { token, span })),
            Err(_) => {
                let slice = &self.inner.source()[span.clone()];
                Some(Err(LexerError {
                    span,
                    message: format!("unexpected character: {:?}", slice),
                }))
            }
        }
    }
}

/// An error that occurred during lexing.
#[derive(Debug, Clone, PartialEq)]
pub struct LexerError {
    pub span: std::ops::Range<usize>,
    pub message: std::string::String,
}

/// Convenience function to lex a source string into a vector of tokens.
pub fn lex(source: &str) -> Result<Vec<SpannedToken>, LexerError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        let tokens = lex("syntax package import message enum service rpc returns stream").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.token).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Syntax,
                Token::Package,
                Token::Import,
                Token::Message,
                Token::Enum,
                Token::Service,
                Token::Rpc,
                Token::Returns,
                Token::Stream,
            ]
        );
    }

    #[test]
    fn test_scalar_types_are_identifiers() {
        let tokens = lex("int32 bytes double").unwrap();
        assert_eq!(tokens[0].token, Token::Ident("int32".to_string()));
        assert_eq!(tokens[1].token, Token::Ident("bytes".to_string()));
        assert_eq!(tokens[2].token, Token::Ident("double".to_string()));
    }

    #[test]
    fn test_symbols() {
        let tokens = lex("{ } ( ) [ ] < > ; , = . : -").unwrap();
        assert_eq!(tokens.len(), 14);
        assert_eq!(tokens[0].token, Token::LBrace);
        assert_eq!(tokens[6].token, Token::LAngle);
        assert_eq!(tokens[8].token, Token::Semi);
        assert_eq!(tokens[11].token, Token::Dot);
        assert_eq!(tokens[13].token, Token::Minus);
    }

    #[test]
    fn test_string_literal() {
        let tokens = lex(r#"import "a/b.proto";"#).unwrap();
        assert_eq!(tokens[0].token, Token::Import);
        assert_eq!(tokens[1].token, Token::StringLiteral("a/b.proto".to_string()));
        assert_eq!(tokens[2].token, Token::Semi);
    }

    #[test]
    fn test_int_literals() {
        let tokens = lex("42 0x2a").unwrap();
        assert_eq!(tokens[0].token, Token::IntLiteral(42));
        assert_eq!(tokens[1].token, Token::IntLiteral(42));
    }

    #[test]
    fn test_line_comment_is_a_token() {
        let tokens = lex("// user id\nstring").unwrap();
        assert_eq!(tokens[0].token, Token::Comment("user id".to_string()));
        assert_eq!(tokens[1].token, Token::Ident("string".to_string()));
    }

    #[test]
    fn test_block_comment_is_skipped() {
        let tokens = lex("/* ignored\n entirely */ message").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Message);
    }

    #[test]
    fn test_spans() {
        let tokens = lex("package a;").unwrap();
        assert_eq!(tokens[0].span, 0..7);
        assert_eq!(tokens[1].span, 8..9);
    }

    #[test]
    fn test_unexpected_character() {
        let err = lex("message M { % }").unwrap_err();
        assert!(err.message.contains('%'));
        assert_eq!(err.span, 12..13);
    }
}
