//! Conditional-compilation masking and directive scanning.
//!
//! Directive lines and lines inside inactive `#if` branches are blanked out
//! byte-for-byte, so every offset, line and column of the masked text matches
//! the original source. Macro bodies are never expanded into code.

use std::collections::HashMap;

use crate::frontend::syntax::{SyntaxKind, lexer::significant_tokens};

const MAX_EXPANSION_DEPTH: u32 = 8;

/// Macro definitions visible at some point of a translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroEnv {
    macros: HashMap<String, String>,
}

impl MacroEnv {
    /// Builds an environment from `NAME` / `NAME=value` strings.
    pub fn from_defines<S: AsRef<str>>(defines: &[S]) -> Self {
        let mut env = Self::default();
        for define in defines {
            let define = define.as_ref().trim();
            if define.is_empty() {
                continue;
            }
            match define.split_once('=') {
                Some((name, value)) => env.define(name.trim(), value.trim()),
                None => env.define(define, "1"),
            }
        }
        env
    }

    pub fn define(
        &mut self,
        name: &str,
        value: &str,
    ) {
        self.macros.insert(name.to_string(), value.to_string());
    }

    pub fn undefine(
        &mut self,
        name: &str,
    ) {
        self.macros.remove(name);
    }

    pub fn is_defined(
        &self,
        name: &str,
    ) -> bool {
        self.macros.contains_key(name)
    }

    pub fn value(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.macros.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// 1-based line of the `#include`.
    pub line: u32,
    /// The spelled path without quotes or angle brackets.
    pub spelled: String,
    pub angled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessDiagnostic {
    pub line: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    /// Source with directives and inactive regions blanked.
    pub text: String,
    pub includes: Vec<IncludeDirective>,
    pub diagnostics: Vec<PreprocessDiagnostic>,
}

#[derive(Debug, Clone, Copy)]
struct Branch {
    parent_active: bool,
    taken: bool,
    active: bool,
    line: u32,
}

/// Runs the conditional-compilation pass over `source`. `on_include` is
/// invoked for every active `#include` before the rest of the file is
/// processed, so macros defined by the included file are visible afterwards.
pub fn preprocess(
    source: &str,
    env: &mut MacroEnv,
    on_include: &mut dyn FnMut(&IncludeDirective, &mut MacroEnv),
) -> Preprocessed {
    let mut out = Preprocessed {
        text: String::with_capacity(source.len()),
        ..Preprocessed::default()
    };
    let mut stack: Vec<Branch> = Vec::new();
    let mut in_comment = false;
    let mut line_no = 0u32;
    let mut lines = source.split_inclusive('\n').peekable();

    while let Some(first) = lines.next() {
        line_no += 1;
        let start_line = line_no;
        let active = stack.last().is_none_or(|b| b.active);
        let directive = !in_comment && first.trim_start().starts_with('#');

        if !directive {
            in_comment = scan_comment_state(first, in_comment);
            if active {
                out.text.push_str(first);
            } else {
                blank_into(&mut out.text, first);
            }
            continue;
        }

        // gather continuation lines
        let mut logical = String::from(first);
        blank_into(&mut out.text, first);
        while ends_with_continuation(&logical) {
            let Some(next) = lines.next() else { break };
            line_no += 1;
            strip_continuation(&mut logical);
            logical.push_str(next);
            blank_into(&mut out.text, next);
        }

        let body = strip_comments(logical.trim_start().trim_start_matches('#'));
        let body = body.trim();
        let (name, rest) = split_directive(body);
        match name {
            "if" => {
                let cond = active && eval_condition(rest, env);
                stack.push(Branch {
                    parent_active: active,
                    taken: cond,
                    active: cond,
                    line: start_line,
                });
            },
            "ifdef" | "ifndef" => {
                let defined = env.is_defined(first_word(rest));
                let cond = active && (defined == (name == "ifdef"));
                stack.push(Branch {
                    parent_active: active,
                    taken: cond,
                    active: cond,
                    line: start_line,
                });
            },
            "elif" | "elifdef" | "elifndef" => match stack.last_mut() {
                Some(branch) => {
                    let cond = match name {
                        "elif" => branch.parent_active && !branch.taken && eval_condition(rest, env),
                        "elifdef" => branch.parent_active && !branch.taken && env.is_defined(first_word(rest)),
                        _ => branch.parent_active && !branch.taken && !env.is_defined(first_word(rest)),
                    };
                    branch.active = cond;
                    branch.taken |= cond;
                },
                None => out.diagnostics.push(PreprocessDiagnostic {
                    line: start_line,
                    message: format!("#{name} without #if"),
                }),
            },
            "else" => match stack.last_mut() {
                Some(branch) => {
                    branch.active = branch.parent_active && !branch.taken;
                    branch.taken = true;
                },
                None => out.diagnostics.push(PreprocessDiagnostic {
                    line: start_line,
                    message: "#else without #if".to_string(),
                }),
            },
            "endif" => {
                if stack.pop().is_none() {
                    out.diagnostics.push(PreprocessDiagnostic {
                        line: start_line,
                        message: "#endif without #if".to_string(),
                    });
                }
            },
            _ if !active => {},
            "define" => {
                let (macro_name, value) = split_define(rest);
                if !macro_name.is_empty() {
                    env.define(macro_name, value);
                }
            },
            "undef" => env.undefine(first_word(rest)),
            "include" | "include_next" | "import" => match parse_include_target(rest, env) {
                Some((spelled, angled)) => {
                    let directive = IncludeDirective {
                        line: start_line,
                        spelled,
                        angled,
                    };
                    on_include(&directive, env);
                    out.includes.push(directive);
                },
                None => out.diagnostics.push(PreprocessDiagnostic {
                    line: start_line,
                    message: format!("malformed #{name} directive"),
                }),
            },
            "error" => out.diagnostics.push(PreprocessDiagnostic {
                line: start_line,
                message: format!("#error {rest}"),
            }),
            _ => {},
        }
    }

    for branch in stack {
        out.diagnostics.push(PreprocessDiagnostic {
            line: branch.line,
            message: "unterminated conditional directive".to_string(),
        });
    }
    out
}

/// Scans a source file for include directives without evaluating conditionals.
pub fn scan_includes(source: &str) -> Vec<IncludeDirective> {
    let env = MacroEnv::default();
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let body = line.trim_start().strip_prefix('#')?.trim_start();
            let (name, rest) = split_directive(body);
            if !matches!(name, "include" | "include_next" | "import") {
                return None;
            }
            let (spelled, angled) = parse_include_target(rest, &env)?;
            Some(IncludeDirective {
                line: idx as u32 + 1,
                spelled,
                angled,
            })
        })
        .collect()
}

fn blank_into(
    out: &mut String,
    line: &str,
) {
    for c in line.chars() {
        match c {
            '\n' | '\r' => out.push(c),
            _ => (0..c.len_utf8()).for_each(|_| out.push(' ')),
        }
    }
}

fn ends_with_continuation(text: &str) -> bool {
    text.trim_end_matches(['\n', '\r']).ends_with('\\')
}

fn strip_continuation(text: &mut String) {
    let trimmed = text.trim_end_matches(['\n', '\r']).len();
    text.truncate(trimmed);
    text.pop();
    text.push(' ');
}

/// Whether a `/* ... */` comment is still open at the end of `line`.
fn scan_comment_state(
    line: &str,
    mut in_comment: bool,
) -> bool {
    let bytes = line.as_bytes();
    let mut i = 0;
    let mut quote: Option<u8> = None;
    while i < bytes.len() {
        let c = bytes[i];
        if in_comment {
            if c == b'*' && bytes.get(i + 1) == Some(&b'/') {
                in_comment = false;
                i += 1;
            }
        } else if let Some(q) = quote {
            if c == b'\\' {
                i += 1;
            } else if c == q {
                quote = None;
            }
        } else {
            match c {
                b'"' | b'\'' => quote = Some(c),
                b'/' if bytes.get(i + 1) == Some(&b'/') => return false,
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    in_comment = true;
                    i += 1;
                },
                _ => {},
            }
        }
        i += 1;
    }
    in_comment
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        if rest.starts_with("//") {
            break;
        }
        if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map(|end| &after[end + 2..]).unwrap_or("");
            out.push(' ');
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn split_directive(body: &str) -> (&str, &str) {
    let end = body.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(body.len());
    (&body[..end], body[end..].trim())
}

fn first_word(text: &str) -> &str {
    let end = text.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(text.len());
    &text[..end]
}

/// `NAME value`, `NAME(args) body` -> (`NAME`, value-or-body).
fn split_define(rest: &str) -> (&str, &str) {
    let name = first_word(rest);
    let after = &rest[name.len()..];
    if after.starts_with('(') {
        let body = after.find(')').map(|end| after[end + 1..].trim()).unwrap_or("");
        return (name, body);
    }
    let value = after.trim();
    (name, if value.is_empty() { "1" } else { value })
}

fn parse_include_target(
    rest: &str,
    env: &MacroEnv,
) -> Option<(String, bool)> {
    let rest = rest.trim();
    if let Some(after) = rest.strip_prefix('"') {
        let end = after.find('"')?;
        return Some((after[..end].to_string(), false));
    }
    if let Some(after) = rest.strip_prefix('<') {
        let end = after.find('>')?;
        return Some((after[..end].to_string(), true));
    }
    // `#include MACRO` expanding to a quoted or angled path
    let value = env.value(first_word(rest))?;
    if value == rest {
        return None;
    }
    parse_include_target(value, &MacroEnv::default())
}

/// Evaluates a `#if` expression. Unknown identifiers evaluate to 0.
pub fn eval_condition(
    expr: &str,
    env: &MacroEnv,
) -> bool {
    let tokens = significant_tokens(expr);
    let mut eval = CondEval {
        tokens: &tokens,
        pos: 0,
        env,
        depth: 0,
    };
    eval.ternary() != 0
}

struct CondEval<'t, 'a> {
    tokens: &'t [(SyntaxKind, &'a str, usize)],
    pos: usize,
    env: &'t MacroEnv,
    depth: u32,
}

impl<'t, 'a> CondEval<'t, 'a> {
    fn peek(&self) -> Option<(SyntaxKind, &'a str)> {
        self.tokens.get(self.pos).map(|(kind, text, _)| (*kind, *text))
    }

    fn eat(
        &mut self,
        kind: SyntaxKind,
    ) -> bool {
        if self.peek().is_some_and(|(k, _)| k == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ternary(&mut self) -> i64 {
        let cond = self.binary(0);
        if self.eat(SyntaxKind::Question) {
            let then = self.ternary();
            self.eat(SyntaxKind::Colon);
            let otherwise = self.ternary();
            return if cond != 0 { then } else { otherwise };
        }
        cond
    }

    fn binary(
        &mut self,
        min_prec: u8,
    ) -> i64 {
        let mut lhs = self.unary();
        while let Some((kind, _)) = self.peek() {
            let prec = match kind {
                SyntaxKind::PipePipe => 1,
                SyntaxKind::AmpAmp => 2,
                SyntaxKind::Pipe => 3,
                SyntaxKind::Caret => 4,
                SyntaxKind::Amp => 5,
                SyntaxKind::EqEq | SyntaxKind::BangEq => 6,
                SyntaxKind::Lt | SyntaxKind::Gt | SyntaxKind::LtEq | SyntaxKind::GtEq => 7,
                SyntaxKind::Shl => 8,
                SyntaxKind::Plus | SyntaxKind::Minus => 9,
                SyntaxKind::Star | SyntaxKind::Slash | SyntaxKind::Percent => 10,
                _ => break,
            };
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.binary(prec + 1);
            lhs = match kind {
                SyntaxKind::PipePipe => i64::from(lhs != 0 || rhs != 0),
                SyntaxKind::AmpAmp => i64::from(lhs != 0 && rhs != 0),
                SyntaxKind::Pipe => lhs | rhs,
                SyntaxKind::Caret => lhs ^ rhs,
                SyntaxKind::Amp => lhs & rhs,
                SyntaxKind::EqEq => i64::from(lhs == rhs),
                SyntaxKind::BangEq => i64::from(lhs != rhs),
                SyntaxKind::Lt => i64::from(lhs < rhs),
                SyntaxKind::Gt => i64::from(lhs > rhs),
                SyntaxKind::LtEq => i64::from(lhs <= rhs),
                SyntaxKind::GtEq => i64::from(lhs >= rhs),
                SyntaxKind::Shl => lhs.checked_shl(rhs as u32).unwrap_or(0),
                SyntaxKind::Plus => lhs.wrapping_add(rhs),
                SyntaxKind::Minus => lhs.wrapping_sub(rhs),
                SyntaxKind::Star => lhs.wrapping_mul(rhs),
                SyntaxKind::Slash => lhs.checked_div(rhs).unwrap_or(0),
                _ => lhs.checked_rem(rhs).unwrap_or(0),
            };
        }
        lhs
    }

    fn unary(&mut self) -> i64 {
        if self.eat(SyntaxKind::Bang) {
            return i64::from(self.unary() == 0);
        }
        if self.eat(SyntaxKind::Minus) {
            return self.unary().wrapping_neg();
        }
        if self.eat(SyntaxKind::Plus) {
            return self.unary();
        }
        if self.eat(SyntaxKind::Tilde) {
            return !self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> i64 {
        let Some((kind, text)) = self.peek() else {
            return 0;
        };
        self.pos += 1;
        match kind {
            SyntaxKind::LParen => {
                let value = self.ternary();
                self.eat(SyntaxKind::RParen);
                value
            },
            SyntaxKind::IntNumber | SyntaxKind::CharLit => parse_number(text),
            SyntaxKind::KwTrue => 1,
            SyntaxKind::Ident if text == "defined" => {
                let parens = self.eat(SyntaxKind::LParen);
                let defined = match self.peek() {
                    Some((_, name)) => {
                        self.pos += 1;
                        self.env.is_defined(name)
                    },
                    None => false,
                };
                if parens {
                    self.eat(SyntaxKind::RParen);
                }
                i64::from(defined)
            },
            SyntaxKind::Ident if text == "__has_include" || text == "__has_include_next" => {
                // skip the argument, assume the header exists
                if self.eat(SyntaxKind::LParen) {
                    while let Some((kind, _)) = self.peek() {
                        self.pos += 1;
                        if kind == SyntaxKind::RParen {
                            break;
                        }
                    }
                }
                1
            },
            SyntaxKind::Ident => {
                if self.peek().is_some_and(|(k, _)| k == SyntaxKind::LParen) {
                    // function-like macro invocation, e.g. __has_feature(x)
                    let mut depth = 0usize;
                    while let Some((kind, _)) = self.peek() {
                        self.pos += 1;
                        match kind {
                            SyntaxKind::LParen => depth += 1,
                            SyntaxKind::RParen => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            },
                            _ => {},
                        }
                    }
                    return 0;
                }
                match self.env.value(text) {
                    Some(value) if self.depth < MAX_EXPANSION_DEPTH => {
                        let tokens = significant_tokens(value);
                        let mut nested = CondEval {
                            tokens: &tokens,
                            pos: 0,
                            env: self.env,
                            depth: self.depth + 1,
                        };
                        nested.ternary()
                    },
                    _ => 0,
                }
            },
            _ => 0,
        }
    }
}

fn parse_number(text: &str) -> i64 {
    if let Some(ch) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return ch.chars().next().map(|c| c as i64).unwrap_or(0);
    }
    let digits: String = text.chars().filter(|c| *c != '\'').collect();
    let digits = digits.trim_end_matches(['u', 'U', 'l', 'L', 'z', 'Z']);
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).unwrap_or(0);
    }
    if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).unwrap_or(0);
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return i64::from_str_radix(&digits[1..], 8).unwrap_or(0);
    }
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/src/frontend/preprocess_tests.rs"]
mod tests;
