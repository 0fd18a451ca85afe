//! CSS Syntax Module Level 3: rule and declaration parsing on top of `cssparser`.
//! Spec: <https://www.w3.org/TR/css-syntax-3/>
use core::fmt::{Display, Formatter, Result as FmtResult};
use std::error::Error;

use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::SourceLocation;
use cssparser::StyleSheetParser;
use cssparser::Token;
use cssparser::parse_one_rule;
use cssparser::serialize_string;

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Raw value text (without trailing !important).
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
}

/// A single style rule with a raw prelude and parsed declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Raw prelude text (typically the selector list).
    pub prelude: String,
    /// Declarations within the rule block.
    pub declarations: Vec<Declaration>,
}

/// An at-rule kept as raw text; only its name is interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtRule {
    /// Lowercased at-keyword without the leading `@`.
    pub name: String,
    /// Raw prelude text.
    pub prelude: String,
    /// Raw block contents, `None` for statement at-rules such as `@import`.
    pub block: Option<String>,
}

/// A top-level rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Style(StyleRule),
    At(AtRule),
}

/// A parsed stylesheet consisting of top-level rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    /// Top-level rules in source order.
    pub rules: Vec<Rule>,
}

/// Returned when text that must hold exactly one rule does not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line of the offending token.
    pub line: u32,
    /// 1-based column of the offending token.
    pub column: u32,
}

impl SyntaxError {
    const fn at(location: SourceLocation) -> Self {
        Self {
            line: location.line + 1,
            column: location.column,
        }
    }
}

impl Display for SyntaxError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FmtResult {
        write!(
            formatter,
            "failed to parse rule at {}:{}",
            self.line, self.column
        )
    }
}

impl Error for SyntaxError {}

/// Parse `!important` at the end of a value, returning (`value_without_important`, `important_flag`).
fn split_important_tail(value: &str) -> (String, bool) {
    let trimmed = value.trim();
    if let Some(bang) = trimmed.rfind('!')
        && let Some(tail) = trimmed.get(bang + 1..)
        && tail.trim().eq_ignore_ascii_case("important")
        && let Some(prefix) = trimmed.get(..bang)
    {
        return (prefix.trim_end().to_owned(), true);
    }
    (trimmed.to_owned(), false)
}

/// A declaration parser that records property name and its raw value.
struct BodyDeclParser;

impl<'i> CssDeclarationParser<'i> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        // Consume until end of the declaration item.
        while input.next_including_whitespace_and_comments().is_ok() {}
        let raw = input.slice_from(start);
        let (value, important) = split_important_tail(raw);
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }
}

impl CssAtRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration; // Not produced
    type Error = ();
}

impl CssQualifiedRuleParser<'_> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration; // Not produced
    type Error = ();
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Top-level parser that builds `Rule` items for qualified rules and at-rules.
struct TopLevelParser;

impl<'i> CssAtRuleParser<'i> for TopLevelParser {
    /// (lowercased name, raw prelude)
    type Prelude = (String, String);
    type AtRule = Rule;
    type Error = ();

    #[inline]
    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        Ok((
            name.to_ascii_lowercase(),
            input.slice_from(start).trim().to_owned(),
        ))
    }

    #[inline]
    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let (name, prelude_text) = prelude;
        Ok(Rule::At(AtRule {
            name,
            prelude: prelude_text,
            block: Some(input.slice_from(start).trim().to_owned()),
        }))
    }

    #[inline]
    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        let (name, prelude_text) = prelude;
        Ok(Rule::At(AtRule {
            name,
            prelude: prelude_text,
            block: None,
        }))
    }
}

impl<'i> CssQualifiedRuleParser<'i> for TopLevelParser {
    type Prelude = String; // raw selector/prelude
    type QualifiedRule = Rule;
    type Error = ();

    #[inline]
    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.state();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let prelude = input.slice_from(start.position()).trim();
        if prelude.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid));
        }
        Ok(prelude.to_owned())
    }

    #[inline]
    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let decls = parse_declarations_from_block(input);
        Ok(Rule::Style(StyleRule {
            prelude,
            declarations: decls,
        }))
    }
}

/// Parse declarations from a rule block using `cssparser` body parser.
fn parse_declarations_from_block(block: &mut Parser) -> Vec<Declaration> {
    let mut out: Vec<Declaration> = Vec::new();
    let mut body = BodyDeclParser;
    for decl in CssRuleBodyParser::new(block, &mut body).flatten() {
        out.push(decl);
    }
    out
}

/// Parse a full stylesheet into a `Stylesheet` using cssparser.
///
/// Invalid rules are dropped and parsing resumes at the next rule.
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut top = TopLevelParser;
    let mut sheet = Stylesheet::default();
    for rule in StyleSheetParser::new(&mut parser, &mut top).flatten() {
        sheet.rules.push(rule);
    }
    sheet
}

/// Parse text that must contain exactly one rule, as `CSSStyleSheet.insertRule` requires.
///
/// # Errors
///
/// Returns `SyntaxError` for empty input, invalid rules, or trailing content after the rule.
pub fn parse_rule(css: &str) -> Result<Rule, SyntaxError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut top = TopLevelParser;
    parse_one_rule(&mut parser, &mut top).map_err(|err| SyntaxError::at(err.location))
}

/// Extract the url of a value that starts with `url(...)`.
///
/// Accepts `url("…")`, `url('…')` and `url(…)`. Returns `None` when the value does not start
/// with a url or the url is empty.
pub fn leading_url(value: &str) -> Option<String> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let token = parser.next().cloned().ok()?;
    url_from_token(&mut parser, &token)
}

/// Extract the first `url(...)` found anywhere among the top-level tokens of a value.
pub fn find_url(value: &str) -> Option<String> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    loop {
        let token = parser.next().cloned().ok()?;
        if let Some(url) = url_from_token(&mut parser, &token) {
            return Some(url);
        }
    }
}

/// Serialize a url as `url("…")`, escaping the string contents.
pub fn serialize_url(url: &str) -> String {
    let mut quoted = String::with_capacity(url.len() + 2);
    if serialize_string(url, &mut quoted).is_err() {
        return format!("url(\"{url}\")");
    }
    format!("url({quoted})")
}

fn url_from_token<'i>(parser: &mut Parser<'i, '_>, token: &Token<'i>) -> Option<String> {
    let url = match token {
        Token::UnquotedUrl(url) => url.to_string(),
        Token::Function(name) if name.eq_ignore_ascii_case("url") => {
            let parsed: Result<String, ParseError<'i, ()>> = parser
                .parse_nested_block(|block| Ok(block.expect_string()?.to_string()));
            parsed.ok()?
        }
        _ => return None,
    };
    (!url.is_empty()).then_some(url)
}
