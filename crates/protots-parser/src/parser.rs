//! Recursive descent parser for the proto language.
//!
//! Parses one file at a time into a shared arena. Type references are left
//! unresolved (`TypeRef::Named`); the loader resolves them once all files
//! are parsed.

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};
use protots_lexer::{lex, LexerError, Token};
use protots_model::{Field, Method, NodeId, NodeKind, Root, ScalarType, TypeRef};
use thiserror::Error;

use crate::ParseOptions;

/// Parser error types.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("lexer error: {message}")]
    LexerError { span: Range<usize>, message: String },

    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        span: Range<usize>,
        expected: String,
        found: String,
    },

    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("{message}")]
    Custom { span: Range<usize>, message: String },
}

impl From<LexerError> for ParseError {
    fn from(err: LexerError) -> Self {
        ParseError::LexerError {
            span: err.span,
            message: err.message,
        }
    }
}

impl ParseError {
    /// Returns the span of this error, if available.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            ParseError::LexerError { span, .. } => Some(span.clone()),
            ParseError::UnexpectedToken { span, .. } => Some(span.clone()),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::Custom { span, .. } => Some(span.clone()),
        }
    }

    /// Prints a pretty error report using ariadne.
    pub fn report(&self, filename: &str, source: &str) {
        let offset = self.span().map(|s| s.start).unwrap_or(0);
        let mut builder =
            Report::build(ReportKind::Error, filename, offset).with_message(format!("{}", self));

        if let Some(span) = self.span() {
            let label = match self {
                ParseError::LexerError { message, .. } => message.clone(),
                ParseError::UnexpectedToken {
                    expected, found, ..
                } => {
                    format!("expected {expected}, found {found}")
                }
                ParseError::Custom { message, .. } => message.clone(),
                ParseError::UnexpectedEof { .. } => unreachable!(),
            };
            builder = builder.with_label(
                Label::new((filename, span))
                    .with_message(label)
                    .with_color(Color::Red),
            );
        }

        let report = builder.finish();
        report
            .print((filename, Source::from(source)))
            .expect("failed to print error report");
    }
}

/// A significant token with an optional leading comment attached.
#[derive(Debug, Clone)]
struct SpannedTok {
    token: Token,
    span: Range<usize>,
    comment: Option<String>,
}

/// Folds comment tokens into the following significant token, so the parser
/// can pick up a field's leading comment without tracking comment state.
fn attach_comments(tokens: Vec<protots_lexer::SpannedToken>) -> Vec<SpannedTok> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut pending: Vec<String> = Vec::new();

    for t in tokens {
        match t.token {
            Token::Comment(text) => pending.push(text),
            token => {
                let comment = if pending.is_empty() {
                    None
                } else {
                    Some(pending.drain(..).collect::<Vec<_>>().join("\n"))
                };
                out.push(SpannedTok {
                    token,
                    span: t.span,
                    comment,
                });
            }
        }
    }

    out
}

/// Parses a single proto source file into the shared tree, returning the
/// file's import paths in declaration order.
pub fn parse_source(
    source: &str,
    root: &mut Root,
    options: &ParseOptions,
) -> Result<Vec<String>, ParseError> {
    Parser::new(source, root, options)?.parse_file()
}

/// Parser for one proto source file.
pub struct Parser<'a> {
    tokens: Vec<SpannedTok>,
    pos: usize,
    root: &'a mut Root,
    keep_case: bool,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source.
    pub fn new(
        source: &str,
        root: &'a mut Root,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let tokens = attach_comments(lex(source)?);
        Ok(Self {
            tokens,
            pos: 0,
            root,
            keep_case: options.keep_case,
        })
    }

    fn current(&self) -> Option<&SpannedTok> {
        self.tokens.get(self.pos)
    }

    fn current_token(&self) -> Option<&Token> {
        self.current().map(|st| &st.token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consumes the current token if it matches, returning whether it did.
    fn eat(&mut self, token: Token) -> bool {
        if self.current_token() == Some(&token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects and consumes a specific token.
    fn expect(&mut self, expected: Token) -> Result<SpannedTok, ParseError> {
        match self.current() {
            Some(st) if std::mem::discriminant(&st.token) == std::mem::discriminant(&expected) => {
                let st = st.clone();
                self.advance();
                Ok(st)
            }
            Some(st) => Err(ParseError::UnexpectedToken {
                span: st.span.clone(),
                expected: format!("{expected:?}"),
                found: format!("{:?}", st.token),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: format!("{expected:?}"),
            }),
        }
    }

    /// Expects and consumes an identifier, returning its name.
    fn expect_ident(&mut self) -> Result<(String, Range<usize>), ParseError> {
        match self.current() {
            Some(SpannedTok {
                token: Token::Ident(name),
                span,
                ..
            }) => {
                let name = name.clone();
                let span = span.clone();
                self.advance();
                Ok((name, span))
            }
            Some(st) => Err(ParseError::UnexpectedToken {
                span: st.span.clone(),
                expected: "identifier".to_string(),
                found: format!("{:?}", st.token),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "identifier".to_string(),
            }),
        }
    }

    /// Expects and consumes a string literal.
    fn expect_string(&mut self) -> Result<(String, Range<usize>), ParseError> {
        match self.current() {
            Some(SpannedTok {
                token: Token::StringLiteral(value),
                span,
                ..
            }) => {
                let value = value.clone();
                let span = span.clone();
                self.advance();
                Ok((value, span))
            }
            Some(st) => Err(ParseError::UnexpectedToken {
                span: st.span.clone(),
                expected: "string literal".to_string(),
                found: format!("{:?}", st.token),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "string literal".to_string(),
            }),
        }
    }

    /// Expects an integer literal with optional leading minus sign.
    fn expect_int(&mut self) -> Result<(i64, Range<usize>), ParseError> {
        let negative = self.eat(Token::Minus);
        match self.current() {
            Some(SpannedTok {
                token: Token::IntLiteral(value),
                span,
                ..
            }) => {
                let value = if negative { -*value } else { *value };
                let span = span.clone();
                self.advance();
                Ok((value, span))
            }
            Some(st) => Err(ParseError::UnexpectedToken {
                span: st.span.clone(),
                expected: "integer literal".to_string(),
                found: format!("{:?}", st.token),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "integer literal".to_string(),
            }),
        }
    }

    /// Parses an entire file into the shared tree, returning the imports.
    pub fn parse_file(&mut self) -> Result<Vec<String>, ParseError> {
        let mut scope = self.root.root();
        let mut package_seen = false;
        let mut imports = Vec::new();

        while !self.at_end() {
            match self.current_token() {
                Some(Token::Syntax) => self.parse_syntax()?,
                Some(Token::Package) => {
                    if package_seen {
                        let span = self.current().unwrap().span.clone();
                        return Err(ParseError::Custom {
                            span,
                            message: "duplicate package declaration".to_string(),
                        });
                    }
                    scope = self.parse_package()?;
                    package_seen = true;
                }
                Some(Token::Import) => imports.push(self.parse_import()?),
                Some(Token::OptionKw) => self.skip_option_statement()?,
                Some(Token::Message) => self.parse_message(scope)?,
                Some(Token::Enum) => self.parse_enum(scope)?,
                Some(Token::Service) => self.parse_service(scope)?,
                Some(Token::Semi) => self.advance(),
                Some(_) => {
                    let st = self.current().unwrap();
                    return Err(ParseError::UnexpectedToken {
                        span: st.span.clone(),
                        expected: "top-level declaration".to_string(),
                        found: format!("{:?}", st.token),
                    });
                }
                None => break,
            }
        }

        Ok(imports)
    }

    /// Parses `syntax = "proto3";`.
    fn parse_syntax(&mut self) -> Result<(), ParseError> {
        self.expect(Token::Syntax)?;
        self.expect(Token::Eq)?;
        let (level, span) = self.expect_string()?;
        if level != "proto2" && level != "proto3" {
            return Err(ParseError::Custom {
                span,
                message: format!("unknown syntax level: \"{level}\""),
            });
        }
        self.expect(Token::Semi)?;
        Ok(())
    }

    /// Parses `package a.b.c;` and returns the namespace node for `c`,
    /// creating the chain as needed.
    fn parse_package(&mut self) -> Result<NodeId, ParseError> {
        self.expect(Token::Package)?;

        let mut scope = self.root.root();
        let (first, _) = self.expect_ident()?;
        scope = self.root.get_or_insert_namespace(scope, &first);

        while self.eat(Token::Dot) {
            let (segment, _) = self.expect_ident()?;
            scope = self.root.get_or_insert_namespace(scope, &segment);
        }

        self.expect(Token::Semi)?;
        Ok(scope)
    }

    /// Parses `import [public|weak] "path";` and returns the path.
    fn parse_import(&mut self) -> Result<String, ParseError> {
        self.expect(Token::Import)?;
        // `public` and `weak` do not change how the file is loaded here
        let _ = self.eat(Token::Public) || self.eat(Token::Weak);
        let (path, _) = self.expect_string()?;
        self.expect(Token::Semi)?;
        Ok(path)
    }

    /// Parses a message definition, including nested declarations.
    fn parse_message(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.expect(Token::Message)?;
        let (name, _) = self.expect_ident()?;
        let id = self
            .root
            .add_node(parent, name, NodeKind::Message { fields: vec![] });

        self.expect(Token::LBrace)?;

        let mut fields = Vec::new();
        loop {
            match self.current_token() {
                Some(Token::RBrace) | None => break,
                Some(Token::Message) => self.parse_message(id)?,
                Some(Token::Enum) => self.parse_enum(id)?,
                Some(Token::Oneof) => self.parse_oneof(&mut fields)?,
                Some(Token::OptionKw) => self.skip_option_statement()?,
                Some(Token::Reserved) => self.skip_until_semi()?,
                Some(Token::Semi) => self.advance(),
                Some(_) => fields.push(self.parse_field(false)?),
            }
        }

        self.expect(Token::RBrace)?;

        match &mut self.root.node_mut(id).kind {
            NodeKind::Message { fields: slot } => *slot = fields,
            _ => unreachable!("node was created as a message"),
        }
        Ok(())
    }

    /// Parses a field declaration. Fields inside a oneof are marked
    /// optional.
    fn parse_field(&mut self, in_oneof: bool) -> Result<Field, ParseError> {
        let comment = self.current().and_then(|t| t.comment.clone());

        let mut repeated = false;
        let mut optional = in_oneof;
        match self.current_token() {
            Some(Token::Repeated) => {
                repeated = true;
                self.advance();
            }
            Some(Token::Optional) => {
                optional = true;
                self.advance();
            }
            Some(Token::Required) => self.advance(),
            _ => {}
        }

        if let Some(Token::Map) = self.current_token() {
            let span = self.current().unwrap().span.clone();
            return Err(ParseError::Custom {
                span,
                message: "map fields are not supported".to_string(),
            });
        }

        let ty = self.parse_type_ref()?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::Eq)?;
        let (number, span) = self.expect_int()?;
        if number <= 0 {
            return Err(ParseError::Custom {
                span,
                message: format!("invalid field number: {number}"),
            });
        }
        if self.current_token() == Some(&Token::LBracket) {
            self.skip_bracketed_options()?;
        }
        self.expect(Token::Semi)?;

        let name = if self.keep_case {
            name
        } else {
            camel_case(&name)
        };

        Ok(Field {
            name,
            ty,
            repeated,
            optional,
            comment,
        })
    }

    /// Parses a type reference: a scalar keyword, or a possibly dotted,
    /// possibly root-anchored name.
    fn parse_type_ref(&mut self) -> Result<TypeRef, ParseError> {
        let rooted = self.eat(Token::Dot);
        let (first, span) = self.expect_ident()?;

        if first == "group" {
            return Err(ParseError::Custom {
                span,
                message: "group fields are not supported".to_string(),
            });
        }

        let mut segments = vec![first];
        while self.eat(Token::Dot) {
            segments.push(self.expect_ident()?.0);
        }

        if !rooted && segments.len() == 1 {
            if let Some(scalar) = ScalarType::from_keyword(&segments[0]) {
                return Ok(TypeRef::Scalar(scalar));
            }
        }

        let name = segments.join(".");
        Ok(TypeRef::Named(if rooted {
            format!(".{name}")
        } else {
            name
        }))
    }

    /// Parses a oneof block; its members become optional fields of the
    /// enclosing message.
    fn parse_oneof(&mut self, fields: &mut Vec<Field>) -> Result<(), ParseError> {
        self.expect(Token::Oneof)?;
        let _ = self.expect_ident()?;
        self.expect(Token::LBrace)?;

        loop {
            match self.current_token() {
                Some(Token::RBrace) | None => break,
                Some(Token::OptionKw) => self.skip_option_statement()?,
                Some(Token::Semi) => self.advance(),
                Some(_) => fields.push(self.parse_field(true)?),
            }
        }

        self.expect(Token::RBrace)?;
        Ok(())
    }

    /// Parses an enum definition.
    fn parse_enum(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.expect(Token::Enum)?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::LBrace)?;

        let mut values = Vec::new();
        loop {
            match self.current_token() {
                Some(Token::RBrace) | None => break,
                Some(Token::OptionKw) => self.skip_option_statement()?,
                Some(Token::Reserved) => self.skip_until_semi()?,
                Some(Token::Semi) => self.advance(),
                Some(_) => {
                    let (value_name, _) = self.expect_ident()?;
                    self.expect(Token::Eq)?;
                    let (value, span) = self.expect_int()?;
                    let value = i32::try_from(value).map_err(|_| ParseError::Custom {
                        span,
                        message: format!("enum value out of range: {value}"),
                    })?;
                    if self.current_token() == Some(&Token::LBracket) {
                        self.skip_bracketed_options()?;
                    }
                    self.expect(Token::Semi)?;
                    values.push((value_name, value));
                }
            }
        }

        self.expect(Token::RBrace)?;
        self.root.add_node(parent, name, NodeKind::Enum { values });
        Ok(())
    }

    /// Parses a service definition.
    fn parse_service(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.expect(Token::Service)?;
        let (name, _) = self.expect_ident()?;
        self.expect(Token::LBrace)?;

        let mut methods = Vec::new();
        loop {
            match self.current_token() {
                Some(Token::RBrace) | None => break,
                Some(Token::Rpc) => methods.push(self.parse_rpc()?),
                Some(Token::OptionKw) => self.skip_option_statement()?,
                Some(Token::Semi) => self.advance(),
                Some(_) => {
                    let st = self.current().unwrap();
                    return Err(ParseError::UnexpectedToken {
                        span: st.span.clone(),
                        expected: "rpc".to_string(),
                        found: format!("{:?}", st.token),
                    });
                }
            }
        }

        self.expect(Token::RBrace)?;
        self.root.add_node(parent, name, NodeKind::Service { methods });
        Ok(())
    }

    /// Parses an `rpc Name (stream? Req) returns (stream? Res);` method,
    /// with an optional options body instead of the trailing semicolon.
    fn parse_rpc(&mut self) -> Result<Method, ParseError> {
        self.expect(Token::Rpc)?;
        let (name, _) = self.expect_ident()?;

        self.expect(Token::LParen)?;
        let request_stream = self.eat(Token::Stream);
        let request = self.parse_method_type()?;
        self.expect(Token::RParen)?;

        self.expect(Token::Returns)?;
        self.expect(Token::LParen)?;
        let response_stream = self.eat(Token::Stream);
        let response = self.parse_method_type()?;
        self.expect(Token::RParen)?;

        if self.eat(Token::LBrace) {
            loop {
                match self.current_token() {
                    Some(Token::RBrace) => {
                        self.advance();
                        break;
                    }
                    Some(Token::OptionKw) => self.skip_option_statement()?,
                    Some(Token::Semi) => self.advance(),
                    Some(_) => {
                        let st = self.current().unwrap();
                        return Err(ParseError::UnexpectedToken {
                            span: st.span.clone(),
                            expected: "option".to_string(),
                            found: format!("{:?}", st.token),
                        });
                    }
                    None => {
                        return Err(ParseError::UnexpectedEof {
                            expected: "}".to_string(),
                        })
                    }
                }
            }
        } else {
            self.expect(Token::Semi)?;
        }

        Ok(Method {
            name,
            request,
            response,
            request_stream,
            response_stream,
        })
    }

    /// Parses a method request/response type, which must be a named message
    /// reference.
    fn parse_method_type(&mut self) -> Result<TypeRef, ParseError> {
        let span = self.current().map(|t| t.span.clone()).unwrap_or(0..0);
        match self.parse_type_ref()? {
            TypeRef::Scalar(scalar) => Err(ParseError::Custom {
                span,
                message: format!("method type must be a message, found '{}'", scalar.as_str()),
            }),
            ty => Ok(ty),
        }
    }

    /// Skips an `option ...;` statement, tolerating aggregate values with
    /// nested braces, brackets and parentheses.
    fn skip_option_statement(&mut self) -> Result<(), ParseError> {
        self.expect(Token::OptionKw)?;
        let mut depth = 0usize;

        loop {
            match self.current_token() {
                Some(Token::LBrace) | Some(Token::LBracket) | Some(Token::LParen) => {
                    depth += 1;
                    self.advance();
                }
                Some(Token::RBrace) | Some(Token::RBracket) | Some(Token::RParen) => {
                    depth = depth.saturating_sub(1);
                    self.advance();
                }
                Some(Token::Semi) if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => self.advance(),
                None => {
                    return Err(ParseError::UnexpectedEof {
                        expected: ";".to_string(),
                    })
                }
            }
        }
    }

    /// Skips a `[...]` field-option list, tolerating nesting.
    fn skip_bracketed_options(&mut self) -> Result<(), ParseError> {
        self.expect(Token::LBracket)?;
        let mut depth = 1usize;

        while depth > 0 {
            match self.current_token() {
                Some(Token::LBracket) | Some(Token::LBrace) | Some(Token::LParen) => {
                    depth += 1;
                    self.advance();
                }
                Some(Token::RBracket) | Some(Token::RBrace) | Some(Token::RParen) => {
                    depth -= 1;
                    self.advance();
                }
                Some(_) => self.advance(),
                None => {
                    return Err(ParseError::UnexpectedEof {
                        expected: "]".to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Skips the rest of a statement up to and including the semicolon.
    fn skip_until_semi(&mut self) -> Result<(), ParseError> {
        loop {
            match self.current_token() {
                Some(Token::Semi) => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => self.advance(),
                None => {
                    return Err(ParseError::UnexpectedEof {
                        expected: ";".to_string(),
                    })
                }
            }
        }
    }
}

/// Converts a field name to lowerCamelCase: underscores are removed and the
/// following letter is uppercased; existing casing is otherwise preserved.
fn camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Root {
        let mut root = Root::new();
        parse_source(source, &mut root, &ParseOptions::default()).unwrap();
        root
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("user_id"), "userId");
        assert_eq!(camel_case("already_camelCase"), "alreadyCamelCase");
        assert_eq!(camel_case("plain"), "plain");
    }

    #[test]
    fn test_parse_package_and_message() {
        let root = parse(
            r#"
            syntax = "proto3";
            package a.b;

            message M {
                string name = 1;
                repeated int32 counts = 2;
            }
            "#,
        );

        let a = root.get_child(root.root(), "a").unwrap();
        let b = root.get_child(a, "b").unwrap();
        let m = root.get_child(b, "M").unwrap();
        assert!(root.node(m).is_message());

        let fields = root.node(m).fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "name");
        assert_eq!(fields[0].ty, TypeRef::Scalar(ScalarType::String));
        assert!(!fields[0].repeated);
        assert_eq!(fields[1].ty, TypeRef::Scalar(ScalarType::Int32));
        assert!(fields[1].repeated);
    }

    #[test]
    fn test_field_names_are_camel_cased_by_default() {
        let root = parse("message M { string user_name = 1; }");
        let m = root.get_child(root.root(), "M").unwrap();
        assert_eq!(root.node(m).fields()[0].name, "userName");
    }

    #[test]
    fn test_keep_case_option() {
        let mut root = Root::new();
        parse_source(
            "message M { string user_name = 1; }",
            &mut root,
            &ParseOptions { keep_case: true },
        )
        .unwrap();
        let m = root.get_child(root.root(), "M").unwrap();
        assert_eq!(root.node(m).fields()[0].name, "user_name");
    }

    #[test]
    fn test_field_comment() {
        let root = parse(
            r#"
            message M {
                // unique user id
                string id = 1;
                string name = 2;
            }
            "#,
        );
        let m = root.get_child(root.root(), "M").unwrap();
        let fields = root.node(m).fields();
        assert_eq!(fields[0].comment.as_deref(), Some("unique user id"));
        assert_eq!(fields[1].comment, None);
    }

    #[test]
    fn test_oneof_members_are_optional() {
        let root = parse(
            r#"
            message M {
                oneof value {
                    string text = 1;
                    int32 number = 2;
                }
                bool flag = 3;
            }
            "#,
        );
        let m = root.get_child(root.root(), "M").unwrap();
        let fields = root.node(m).fields();
        assert_eq!(fields.len(), 3);
        assert!(fields[0].optional);
        assert!(fields[1].optional);
        assert!(!fields[2].optional);
    }

    #[test]
    fn test_nested_message_and_named_reference() {
        let root = parse(
            r#"
            package pkg;
            message Outer {
                message Inner {
                    string value = 1;
                }
                Inner inner = 1;
                .pkg.Outer.Inner rooted = 2;
            }
            "#,
        );
        let pkg = root.get_child(root.root(), "pkg").unwrap();
        let outer = root.get_child(pkg, "Outer").unwrap();
        let inner = root.get_child(outer, "Inner").unwrap();
        assert!(root.node(inner).is_message());

        let fields = root.node(outer).fields();
        assert_eq!(fields[0].ty, TypeRef::Named("Inner".to_string()));
        assert_eq!(fields[1].ty, TypeRef::Named(".pkg.Outer.Inner".to_string()));
    }

    #[test]
    fn test_parse_enum() {
        let root = parse(
            r#"
            enum Status {
                option allow_alias = true;
                UNKNOWN = 0;
                ACTIVE = 1;
                NEGATIVE = -2;
            }
            "#,
        );
        let e = root.get_child(root.root(), "Status").unwrap();
        assert_eq!(
            root.node(e).enum_values(),
            &[
                ("UNKNOWN".to_string(), 0),
                ("ACTIVE".to_string(), 1),
                ("NEGATIVE".to_string(), -2),
            ]
        );
    }

    #[test]
    fn test_parse_service_with_streams() {
        let root = parse(
            r#"
            package a;
            message Req {}
            message Res {}
            service S {
                rpc Unary (Req) returns (Res);
                rpc ServerStream (Req) returns (stream Res);
                rpc ClientStream (stream Req) returns (Res);
                rpc Bidi (stream Req) returns (stream Res) {
                    option (some.custom) = { a: 1 };
                }
            }
            "#,
        );
        let a = root.get_child(root.root(), "a").unwrap();
        let s = root.get_child(a, "S").unwrap();
        let methods = root.node(s).methods();
        assert_eq!(methods.len(), 4);
        assert!(!methods[0].request_stream && !methods[0].response_stream);
        assert!(!methods[1].request_stream && methods[1].response_stream);
        assert!(methods[2].request_stream && !methods[2].response_stream);
        assert!(methods[3].request_stream && methods[3].response_stream);
        assert_eq!(methods[0].request, TypeRef::Named("Req".to_string()));
    }

    #[test]
    fn test_options_and_reserved_are_skipped() {
        let root = parse(
            r#"
            option java_package = "com.example";
            message M {
                option deprecated = true;
                reserved 2, 15, 9 to 11;
                reserved "foo", "bar";
                string name = 1 [deprecated = true, json_name = "n"];
            }
            "#,
        );
        let m = root.get_child(root.root(), "M").unwrap();
        assert_eq!(root.node(m).fields().len(), 1);
    }

    #[test]
    fn test_two_files_share_a_package() {
        let mut root = Root::new();
        let options = ParseOptions::default();
        parse_source("package a.b; message M {}", &mut root, &options).unwrap();
        parse_source("package a.b; message N {}", &mut root, &options).unwrap();

        let a = root.get_child(root.root(), "a").unwrap();
        let b = root.get_child(a, "b").unwrap();
        assert_eq!(root.children(b).len(), 2);
        assert_eq!(root.children(root.root()).len(), 1);
    }

    #[test]
    fn test_imports_are_returned() {
        let mut root = Root::new();
        let imports = parse_source(
            r#"
            import "a/b.proto";
            import public "c.proto";
            "#,
            &mut root,
            &ParseOptions::default(),
        )
        .unwrap();
        assert_eq!(imports, vec!["a/b.proto".to_string(), "c.proto".to_string()]);
    }

    #[test]
    fn test_bad_syntax_level() {
        let mut root = Root::new();
        let err = parse_source(
            r#"syntax = "proto9";"#,
            &mut root,
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("proto9"));
    }

    #[test]
    fn test_map_field_is_rejected() {
        let mut root = Root::new();
        let err = parse_source(
            "message M { map<string, int32> values = 1; }",
            &mut root,
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("map fields"));
    }

    #[test]
    fn test_scalar_method_type_is_rejected() {
        let mut root = Root::new();
        let err = parse_source(
            "service S { rpc M (string) returns (string); }",
            &mut root,
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be a message"));
    }

    #[test]
    fn test_unexpected_token_has_span() {
        let mut root = Root::new();
        let err = parse_source("message { }", &mut root, &ParseOptions::default()).unwrap_err();
        assert!(err.span().is_some());
    }
}
