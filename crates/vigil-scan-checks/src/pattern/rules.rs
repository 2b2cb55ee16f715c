//! A YARA-style rule language.
//!
//! Supported: `rule` blocks with optional `private`/`global` prefixes and
//! tags, `meta:` entries, `strings:` with text (`"..."`, escapes `\" \\ \n
//! \t \r \xHH`), hex (`{ 4D 5A ?? [2-4] }`) and regex (`/.../is`) values,
//! the `nocase`, `ascii` and `private` modifiers, and conditions built from
//! `and`, `or`, `not`, parentheses, `true`, `false`, `$id`, and
//! `any|all|N of them|($a, $b)`. `//` and `/* */` comments are ignored.

use regex::bytes::{Regex, RegexBuilder};
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use thiserror::Error;

const RESERVED: &[&str] = &[
    "rule", "private", "global", "meta", "strings", "condition", "and", "or", "not", "of",
    "them", "any", "all", "true", "false",
];

/// A compile error with the 1-based source line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct RuleError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
enum Quantifier {
    Any,
    All,
    AtLeast(usize),
}

#[derive(Debug, Clone)]
enum Expr {
    Bool(bool),
    Found(usize),
    Of(Quantifier, Vec<usize>),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    fn eval(&self, found: &[bool]) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Found(i) => found[*i],
            Self::Of(quantifier, set) => {
                let hits = set.iter().filter(|i| found[**i]).count();
                match quantifier {
                    Quantifier::Any => hits >= 1,
                    Quantifier::All => hits == set.len(),
                    Quantifier::AtLeast(n) => hits >= *n,
                }
            }
            Self::Not(e) => !e.eval(found),
            Self::And(es) => es.iter().all(|e| e.eval(found)),
            Self::Or(es) => es.iter().any(|e| e.eval(found)),
        }
    }
}

#[derive(Debug)]
struct StringDef {
    id: String,
    regex: Regex,
}

/// One compiled rule.
#[derive(Debug)]
pub struct Rule {
    name: String,
    tags: Vec<String>,
    meta: BTreeMap<String, String>,
    private: bool,
    strings: Vec<StringDef>,
    condition: Expr,
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    fn matches(&self, data: &[u8]) -> bool {
        let found: Vec<bool> = self.strings.iter().map(|s| s.regex.is_match(data)).collect();
        self.condition.eval(&found)
    }
}

/// A compiled set of rules.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile rule source text.
    pub fn compile(source: &str) -> Result<Self, RuleError> {
        let rules = Parser::new(source).parse_rules()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Names of the non-private rules matching `data`, in source order.
    pub fn scan(&self, data: &[u8]) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| !rule.private && rule.matches(data))
            .map(|rule| rule.name.clone())
            .collect()
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
}

type PResult<T> = Result<T, RuleError>;

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> RuleError {
        RuleError {
            line: self.line,
            message: message.into(),
        }
    }

    fn current(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.current()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) -> PResult<()> {
        loop {
            match (self.current(), self.src.get(self.pos + 1).copied()) {
                (Some(b), _) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                (Some(b'/'), Some(b'/')) => {
                    while let Some(b) = self.current() {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let start = self.line;
                    self.pos += 2;
                    loop {
                        match self.bump() {
                            Some(b'*') if self.current() == Some(b'/') => {
                                self.pos += 1;
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(RuleError {
                                    line: start,
                                    message: "unterminated comment".into(),
                                })
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn peek(&mut self) -> PResult<Option<u8>> {
        self.skip_trivia()?;
        Ok(self.current())
    }

    fn eat(&mut self, c: u8) -> PResult<bool> {
        if self.peek()? == Some(c) {
            self.bump();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, c: u8) -> PResult<()> {
        if self.eat(c)? {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c as char)))
        }
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while self.current().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn peek_keyword(&mut self, keyword: &str) -> PResult<bool> {
        if !self.peek()?.is_some_and(is_ident_start) {
            return Ok(false);
        }
        let start = self.pos;
        let word = self.read_word();
        self.pos = start;
        Ok(word == keyword)
    }

    fn keyword(&mut self, keyword: &str) -> PResult<bool> {
        if self.peek_keyword(keyword)? {
            self.pos += keyword.len();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn identifier(&mut self, what: &str) -> PResult<String> {
        if !self.peek()?.is_some_and(is_ident_start) {
            return Err(self.error(format!("expected {what}")));
        }
        Ok(self.read_word())
    }

    fn string_id(&mut self) -> PResult<String> {
        if self.peek()? != Some(b'$') {
            return Err(self.error("expected string identifier"));
        }
        self.pos += 1;
        let name = self.read_word();
        if name.is_empty() {
            return Err(self.error("anonymous strings are not supported"));
        }
        Ok(format!("${name}"))
    }

    fn number(&mut self) -> PResult<Option<usize>> {
        if !self.peek()?.is_some_and(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        let start = self.pos;
        while self.current().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or_default();
        digits
            .parse()
            .map(Some)
            .map_err(|_| self.error(format!("number out of range: {digits}")))
    }

    fn parse_rules(mut self) -> PResult<Vec<Rule>> {
        let mut rules = Vec::new();
        let mut names = HashSet::new();
        while self.peek()?.is_some() {
            let line = self.line;
            let rule = self.parse_rule()?;
            if !names.insert(rule.name.clone()) {
                return Err(RuleError {
                    line,
                    message: format!("duplicate rule identifier '{}'", rule.name),
                });
            }
            rules.push(rule);
        }
        Ok(rules)
    }

    fn parse_rule(&mut self) -> PResult<Rule> {
        let mut private = false;
        loop {
            if self.keyword("private")? {
                private = true;
            } else if !self.keyword("global")? {
                break;
            }
        }
        if !self.keyword("rule")? {
            return Err(self.error("expected 'rule'"));
        }
        let name = self.identifier("rule identifier")?;
        if RESERVED.contains(&name.as_str()) {
            return Err(self.error(format!("'{name}' is a reserved word")));
        }

        let mut tags = Vec::new();
        if self.eat(b':')? {
            while self.peek()?.is_some_and(is_ident_start) {
                tags.push(self.read_word());
            }
            if tags.is_empty() {
                return Err(self.error("expected tag after ':'"));
            }
        }
        self.expect(b'{')?;

        let mut meta = BTreeMap::new();
        if self.keyword("meta")? {
            self.expect(b':')?;
            while !self.peek_keyword("strings")? && !self.peek_keyword("condition")? {
                let key = self.identifier("meta identifier")?;
                self.expect(b'=')?;
                let value = self.meta_value()?;
                meta.insert(key, value);
            }
        }

        let mut strings = Vec::new();
        if self.keyword("strings")? {
            self.expect(b':')?;
            while self.peek()? == Some(b'$') {
                let line = self.line;
                let id = self.string_id()?;
                if strings.iter().any(|s: &StringDef| s.id == id) {
                    return Err(RuleError {
                        line,
                        message: format!("duplicate string identifier '{id}'"),
                    });
                }
                self.expect(b'=')?;
                let regex = self.string_value()?;
                strings.push(StringDef { id, regex });
            }
            if strings.is_empty() {
                return Err(self.error("empty strings section"));
            }
        }

        if !self.keyword("condition")? {
            return Err(self.error("expected 'condition'"));
        }
        self.expect(b':')?;
        let condition = self.parse_or(&strings)?;
        self.expect(b'}')?;

        Ok(Rule {
            name,
            tags,
            meta,
            private,
            strings,
            condition,
        })
    }

    fn meta_value(&mut self) -> PResult<String> {
        match self.peek()? {
            Some(b'"') => return Ok(String::from_utf8_lossy(&self.quoted()?).into_owned()),
            Some(b'-') => {
                self.bump();
                return match self.number()? {
                    Some(n) => Ok(format!("-{n}")),
                    None => Err(self.error("expected number")),
                };
            }
            Some(b) if b.is_ascii_digit() => {
                return Ok(self.number()?.unwrap_or_default().to_string());
            }
            _ => {}
        }
        if self.keyword("true")? {
            Ok("true".into())
        } else if self.keyword("false")? {
            Ok("false".into())
        } else {
            Err(self.error("expected meta value"))
        }
    }

    fn quoted(&mut self) -> PResult<Vec<u8>> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None | Some(b'\n') => return Err(self.error("unterminated string")),
                Some(b'"') => return Ok(out),
                Some(b'\\') => {
                    let escaped = match self.bump() {
                        Some(b'"') => b'"',
                        Some(b'\\') => b'\\',
                        Some(b'n') => b'\n',
                        Some(b't') => b'\t',
                        Some(b'r') => b'\r',
                        Some(b'x') => {
                            let hi = self.bump().and_then(hex_value);
                            let lo = self.bump().and_then(hex_value);
                            match (hi, lo) {
                                (Some(hi), Some(lo)) => (hi << 4) | lo,
                                _ => return Err(self.error("invalid \\x escape")),
                            }
                        }
                        _ => return Err(self.error("invalid escape sequence")),
                    };
                    out.push(escaped);
                }
                Some(b) => out.push(b),
            }
        }
    }

    fn string_value(&mut self) -> PResult<Regex> {
        let line = self.line;
        let (pattern, mut case_insensitive, dot_all) = match self.peek()? {
            Some(b'"') => {
                let text = self.quoted()?;
                if text.is_empty() {
                    return Err(self.error("empty text string"));
                }
                (literal_pattern(&text), false, false)
            }
            Some(b'{') => (self.hex_pattern()?, false, false),
            Some(b'/') => {
                let (pattern, i, s) = self.regex_literal()?;
                (pattern, i, s)
            }
            _ => return Err(self.error("expected string value")),
        };

        loop {
            if self.keyword("nocase")? {
                case_insensitive = true;
            } else if self.keyword("ascii")? || self.keyword("private")? {
            } else if self.peek()?.is_some_and(is_ident_start) {
                let start = self.pos;
                let word = self.read_word();
                if matches!(word.as_str(), "wide" | "fullword" | "xor" | "base64" | "base64wide") {
                    return Err(self.error(format!("modifier '{word}' is not supported")));
                }
                self.pos = start;
                break;
            } else {
                break;
            }
        }

        RegexBuilder::new(&pattern)
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(dot_all)
            .build()
            .map_err(|e| RuleError {
                line,
                message: format!("invalid pattern: {e}"),
            })
    }

    fn hex_pattern(&mut self) -> PResult<String> {
        self.expect(b'{')?;
        let mut pattern = String::from("(?s-u:");
        let mut tokens = 0usize;
        loop {
            match self.peek()? {
                Some(b'}') => {
                    self.bump();
                    break;
                }
                Some(b'?') => {
                    self.bump();
                    if self.bump() != Some(b'?') {
                        return Err(self.error("nibble wildcards are not supported"));
                    }
                    pattern.push('.');
                    tokens += 1;
                }
                Some(b'[') => {
                    self.bump();
                    if tokens == 0 {
                        return Err(self.error("hex string cannot start with a jump"));
                    }
                    let low = self.number()?.unwrap_or(0);
                    let high = if self.eat(b'-')? { self.number()? } else { Some(low) };
                    self.expect(b']')?;
                    match high {
                        Some(high) if high < low => {
                            return Err(self.error("invalid jump range"));
                        }
                        Some(high) => {
                            let _ = write!(pattern, ".{{{low},{high}}}");
                        }
                        None => {
                            let _ = write!(pattern, ".{{{low},}}");
                        }
                    }
                }
                Some(b) if hex_value(b).is_some() => {
                    self.bump();
                    let lo = self.bump().and_then(hex_value);
                    let hi = hex_value(b);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => {
                            let _ = write!(pattern, "\\x{:02x}", (hi << 4) | lo);
                        }
                        _ => return Err(self.error("invalid hex byte")),
                    }
                    tokens += 1;
                }
                Some(b'(') | Some(b'|') => {
                    return Err(self.error("hex alternatives are not supported"));
                }
                Some(_) => return Err(self.error("invalid character in hex string")),
                None => return Err(self.error("unterminated hex string")),
            }
        }
        if tokens == 0 {
            return Err(self.error("empty hex string"));
        }
        pattern.push(')');
        Ok(pattern)
    }

    fn regex_literal(&mut self) -> PResult<(String, bool, bool)> {
        self.expect(b'/')?;
        let mut pattern = Vec::new();
        loop {
            match self.bump() {
                None | Some(b'\n') => return Err(self.error("unterminated regular expression")),
                Some(b'/') => break,
                Some(b'\\') if self.current() == Some(b'/') => {
                    self.bump();
                    pattern.push(b'/');
                }
                Some(b'\\') => {
                    pattern.push(b'\\');
                    if let Some(b) = self.bump() {
                        pattern.push(b);
                    }
                }
                Some(b) => pattern.push(b),
            }
        }
        if pattern.is_empty() {
            return Err(self.error("empty regular expression"));
        }
        let mut case_insensitive = false;
        let mut dot_all = false;
        loop {
            match self.current() {
                Some(b'i') => case_insensitive = true,
                Some(b's') => dot_all = true,
                _ => break,
            }
            self.pos += 1;
        }
        Ok((String::from_utf8_lossy(&pattern).into_owned(), case_insensitive, dot_all))
    }

    fn parse_or(&mut self, strings: &[StringDef]) -> PResult<Expr> {
        let mut terms = vec![self.parse_and(strings)?];
        while self.keyword("or")? {
            terms.push(self.parse_and(strings)?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::Or(terms) })
    }

    fn parse_and(&mut self, strings: &[StringDef]) -> PResult<Expr> {
        let mut terms = vec![self.parse_not(strings)?];
        while self.keyword("and")? {
            terms.push(self.parse_not(strings)?);
        }
        Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::And(terms) })
    }

    fn parse_not(&mut self, strings: &[StringDef]) -> PResult<Expr> {
        if self.keyword("not")? {
            return Ok(Expr::Not(Box::new(self.parse_not(strings)?)));
        }
        self.parse_primary(strings)
    }

    fn resolve(&self, strings: &[StringDef], id: &str) -> PResult<usize> {
        strings
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| self.error(format!("undefined string identifier '{id}'")))
    }

    fn parse_primary(&mut self, strings: &[StringDef]) -> PResult<Expr> {
        if self.eat(b'(')? {
            let expr = self.parse_or(strings)?;
            self.expect(b')')?;
            return Ok(expr);
        }
        if self.keyword("true")? {
            return Ok(Expr::Bool(true));
        }
        if self.keyword("false")? {
            return Ok(Expr::Bool(false));
        }
        if self.peek()? == Some(b'$') {
            let id = self.string_id()?;
            return Ok(Expr::Found(self.resolve(strings, &id)?));
        }

        let quantifier = if self.keyword("any")? {
            Quantifier::Any
        } else if self.keyword("all")? {
            Quantifier::All
        } else if let Some(n) = self.number()? {
            Quantifier::AtLeast(n)
        } else {
            return Err(self.error("expected condition expression"));
        };
        if !self.keyword("of")? {
            return Err(self.error("expected 'of'"));
        }

        let set = if self.keyword("them")? {
            (0..strings.len()).collect::<Vec<_>>()
        } else {
            self.expect(b'(')?;
            let mut set = vec![];
            loop {
                let id = self.string_id()?;
                set.push(self.resolve(strings, &id)?);
                if !self.eat(b',')? {
                    break;
                }
            }
            self.expect(b')')?;
            set
        };
        if set.is_empty() {
            return Err(self.error("rule has no strings to match"));
        }
        Ok(Expr::Of(quantifier, set))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Byte-exact pattern for a text string.
fn literal_pattern(text: &[u8]) -> String {
    let mut pattern = String::from("(?-u:");
    for &b in text {
        if b.is_ascii_alphanumeric() {
            pattern.push(b as char);
        } else {
            let _ = write!(pattern, "\\x{b:02x}");
        }
    }
    pattern.push(')');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scan(source: &str, data: &[u8]) -> Vec<String> {
        RuleSet::compile(source).unwrap().scan(data)
    }

    #[test]
    fn test_simple_text_rule() {
        let rules = r#"rule Malicious { strings: $a = "evilpattern" condition: $a }"#;
        assert_eq!(scan(rules, b"some evilpattern inside"), vec!["Malicious"]);
        assert!(scan(rules, b"harmless").is_empty());
    }

    #[test]
    fn test_meta_tags_and_comments() {
        let rules = r#"
            // leading comment
            rule Tagged : backdoor python {
                meta:
                    author = "ops"
                    severity = 3
                    active = true
                /* block
                   comment */
                strings:
                    $cmd = "os.system(" // trailing
                condition:
                    $cmd
            }
        "#;
        let set = RuleSet::compile(rules).unwrap();
        let rule = &set.rules()[0];
        assert_eq!(rule.tags(), ["backdoor", "python"]);
        assert_eq!(rule.meta()["severity"], "3");
        assert_eq!(rule.meta()["author"], "ops");
        assert_eq!(set.scan(b"import os\nos.system('id')"), vec!["Tagged"]);
    }

    #[test]
    fn test_nocase_and_escapes() {
        let rules = r#"rule R { strings: $a = "Eval(\"x\")" nocase condition: $a }"#;
        assert_eq!(scan(rules, br#"EVAL("X")"#), vec!["R"]);

        let rules = r#"rule Tab { strings: $a = "a\tb\x41" condition: $a }"#;
        assert_eq!(scan(rules, b"a\tbA"), vec!["Tab"]);
    }

    #[test]
    fn test_hex_strings() {
        let rules = "rule MZ { strings: $mz = { 4D 5A ?? 00 [1-2] FF } condition: $mz }";
        assert_eq!(scan(rules, &[0x4d, 0x5a, 0x90, 0x00, 0x01, 0xff]), vec!["MZ"]);
        assert_eq!(scan(rules, &[0x4d, 0x5a, 0x90, 0x00, 0x01, 0x02, 0xff]), vec!["MZ"]);
        assert!(scan(rules, &[0x4d, 0x5a, 0x90, 0x00, 0xff]).is_empty());
    }

    #[test]
    fn test_regex_strings() {
        let rules = r"rule B64 { strings: $r = /exec\(base64\.b64decode/i condition: $r }";
        assert_eq!(scan(rules, b"EXEC(base64.b64decode('...'))"), vec!["B64"]);

        let rules = r"rule Slash { strings: $r = /a\/b/ condition: $r }";
        assert_eq!(scan(rules, b"xa/by"), vec!["Slash"]);
    }

    #[test]
    fn test_boolean_conditions() {
        let rules = r#"
            rule Both { strings: $a = "foo" $b = "bar" condition: $a and $b }
            rule Either { strings: $a = "foo" $b = "bar" condition: $a or $b }
            rule Neither { strings: $a = "foo" condition: not $a }
            rule Grouped { strings: $a = "foo" $b = "bar" $c = "baz" condition: ($a or $b) and not $c }
            rule Always { condition: true }
        "#;
        assert_eq!(scan(rules, b"foo"), vec!["Either", "Grouped", "Always"]);
        assert_eq!(scan(rules, b"foo bar"), vec!["Both", "Either", "Grouped", "Always"]);
        assert_eq!(scan(rules, b"foo baz"), vec!["Either", "Always"]);
        assert_eq!(scan(rules, b""), vec!["Neither", "Always"]);
    }

    #[test]
    fn test_of_expressions() {
        let rules = r#"
            rule AnyOf { strings: $a = "x1" $b = "x2" $c = "x3" condition: any of them }
            rule AllOf { strings: $a = "x1" $b = "x2" condition: all of them }
            rule TwoOf { strings: $a = "x1" $b = "x2" $c = "x3" condition: 2 of ($a, $c) }
        "#;
        assert_eq!(scan(rules, b"x1"), vec!["AnyOf"]);
        assert_eq!(scan(rules, b"x1 x2"), vec!["AnyOf", "AllOf"]);
        assert_eq!(scan(rules, b"x1 x3"), vec!["AnyOf", "TwoOf"]);
    }

    #[test]
    fn test_private_rules_not_reported() {
        let rules = r#"private rule Hidden { strings: $a = "x" condition: $a }"#;
        assert!(scan(rules, b"x").is_empty());
    }

    #[test]
    fn test_compile_errors_carry_line() {
        let err = RuleSet::compile("rule A {\n  strings:\n    $a = \"x\"\n  condition:\n    $b\n}")
            .unwrap_err();
        assert_eq!(err.line, 5);
        assert!(err.message.contains("$b"));

        let err = RuleSet::compile("rule A { condition: true }\nrule A { condition: false }")
            .unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("duplicate rule"));

        assert!(RuleSet::compile("rule { condition: true }").is_err());
        assert!(RuleSet::compile("rule A { strings: $a = \"x\" }").is_err());
        assert!(RuleSet::compile("rule A { strings: $a = \"x\" wide condition: $a }").is_err());
        assert!(RuleSet::compile("rule A { strings: $a = /(/ condition: $a }").is_err());
        assert!(RuleSet::compile("rule A { condition: any of them }").is_err());
        assert!(RuleSet::compile("rule A { condition: true").is_err());
        assert!(RuleSet::compile("/* open").is_err());
    }

    #[test]
    fn test_empty_source_compiles_to_no_rules() {
        let set = RuleSet::compile("  // nothing here\n").unwrap();
        assert!(set.rules().is_empty());
        assert!(set.scan(b"anything").is_empty());
    }

    proptest! {
        #[test]
        fn prop_text_string_matches_itself(text in "[ -!#-\\[\\]-~]{1,24}", pad in "[a-z]{0,8}") {
            let rules = format!("rule T {{ strings: $a = \"{text}\" condition: $a }}");
            let set = RuleSet::compile(&rules).unwrap();
            let data = format!("{pad}{text}{pad}");
            prop_assert_eq!(set.scan(data.as_bytes()), vec!["T".to_string()]);
        }
    }
}
