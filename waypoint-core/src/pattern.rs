//! Path pattern compilation.
//!
//! A pattern is a path with parameter placeholders:
//!
//! - `:name` matches one segment, `:name?` makes it optional
//! - `:name*` / `:name+` match zero-or-more / one-or-more segments
//! - `:name(\d+)` restricts the segment with a custom expression
//! - `*` matches anything and is captured as `pathMatch`
//!
//! Patterns match case-insensitively and ignore one trailing slash unless
//! [`PatternOptions`] say otherwise.

use crate::{location::Params, query::decode};
use regex::Regex;
use serde::Deserialize;
use std::{collections::HashSet, sync::LazyLock};
use thiserror::Error;

static PATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\\.)|([/.])?(?:(?::(\w+)(?:\(((?:\\.|[^\\()])+)\))?|\(((?:\\.|[^\\()])+)\))([+*?])?|(\*))",
    )
    .expect("path token expression is valid")
});

/// Name given to the first unnamed capture (the `*` wildcard).
pub const PATH_MATCH: &str = "pathMatch";

/// Options controlling how a pattern matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    /// Match case-sensitively.
    pub sensitive: bool,
    /// Require an exact trailing slash.
    pub strict: bool,
}

/// A parameter declared by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamKey {
    /// Declared name, or `pathMatch` / the capture index for unnamed captures.
    pub name: String,
    /// Delimiter preceding the parameter (`/`, `.` or empty).
    pub prefix: String,
    /// Declared with `?` or `*`.
    pub optional: bool,
    /// Declared with `+` or `*`.
    pub repeat: bool,
    /// Followed by literal text rather than another delimiter.
    pub partial: bool,
    /// The `*` wildcard.
    pub asterisk: bool,
    /// Expression a segment must match.
    pub pattern: String,
}

#[derive(Debug, Clone)]
enum Token {
    Static(String),
    Param(usize),
}

/// Errors substituting params into a pattern.
#[derive(Error, Debug)]
pub enum FillError {
    /// A required parameter has no value.
    #[error("expected \"{0}\" to be defined")]
    Missing(String),

    /// A value does not satisfy the parameter's expression.
    #[error("expected \"{name}\" to match \"{pattern}\", but received \"{value}\"")]
    Mismatch {
        /// Parameter name.
        name: String,
        /// Parameter expression.
        pattern: String,
        /// The encoded value.
        value: String,
    },

    /// The pattern itself does not compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    tokens: Vec<Token>,
    keys: Vec<ParamKey>,
    validators: Vec<Regex>,
    regex: Regex,
}

impl PathPattern {
    /// Compile `source` into a matcher.
    pub fn compile(source: &str, options: PatternOptions) -> Result<Self, regex::Error> {
        let (tokens, keys) = tokenize(source);
        let regex = build_regex(&tokens, &keys, options)?;
        let flags = case_flags(options);
        let validators = keys
            .iter()
            .map(|key| Regex::new(&format!("{flags}^(?:{})$", key.pattern)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.to_string(),
            tokens,
            keys,
            validators,
            regex,
        })
    }

    /// The pattern source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared parameters in order.
    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// Names of parameters that must be present to fill the pattern.
    pub fn required_params(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|key| !key.optional)
            .map(|key| key.name.as_str())
    }

    /// Parameter names declared more than once.
    pub fn duplicate_params(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.keys
            .iter()
            .filter(|key| !seen.insert(key.name.as_str()))
            .map(|key| key.name.as_str())
            .collect()
    }

    /// Whether `path` matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and return the decoded parameter values.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let mut params = Params::new();
        for (index, key) in self.keys.iter().enumerate() {
            if let Some(value) = captures.get(index + 1) {
                params.insert(key.name.clone(), decode(value.as_str()));
            }
        }
        Some(params)
    }

    /// Substitute `params` into the pattern.
    pub fn fill(&self, params: &Params) -> Result<String, FillError> {
        let mut path = String::new();
        for token in &self.tokens {
            let index = match token {
                Token::Static(text) => {
                    path.push_str(text);
                    continue;
                }
                Token::Param(index) => *index,
            };
            let key = &self.keys[index];

            let Some(value) = params.get(&key.name) else {
                if key.optional {
                    if key.partial {
                        path.push_str(&key.prefix);
                    }
                    continue;
                }
                return Err(FillError::Missing(key.name.clone()));
            };

            let segment = if key.asterisk {
                encode_asterisk(value)
            } else {
                encode_segment(value)
            };
            if !self.validators[index].is_match(&segment) {
                return Err(FillError::Mismatch {
                    name: key.name.clone(),
                    pattern: key.pattern.clone(),
                    value: segment,
                });
            }
            path.push_str(&key.prefix);
            path.push_str(&segment);
        }
        Ok(path)
    }
}

/// Compile `path` and substitute `params` into it.
pub fn fill_params(path: &str, params: &Params) -> Result<String, FillError> {
    PathPattern::compile(path, PatternOptions::default())?.fill(params)
}

fn tokenize(source: &str) -> (Vec<Token>, Vec<ParamKey>) {
    let mut tokens = Vec::new();
    let mut keys = Vec::new();
    let mut unnamed = 0usize;
    let mut index = 0;
    let mut path = String::new();

    for captures in PATH_TOKEN.captures_iter(source) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        path.push_str(&source[index..whole.start()]);
        index = whole.end();

        if let Some(escaped) = captures.get(1) {
            path.push_str(&escaped.as_str()[1..]);
            continue;
        }

        let next = source[index..].chars().next();
        let prefix = captures.get(2).map(|m| m.as_str());
        let modifier = captures.get(6).map(|m| m.as_str());
        let asterisk = captures.get(7).is_some();

        if !path.is_empty() {
            tokens.push(Token::Static(std::mem::take(&mut path)));
        }

        let partial = match (prefix, next) {
            (Some(prefix), Some(next)) => !prefix.starts_with(next),
            _ => false,
        };
        let delimiter = prefix.unwrap_or("/");
        let pattern = match captures.get(4).or(captures.get(5)) {
            Some(custom) => custom.as_str().to_string(),
            None if asterisk => ".*".to_string(),
            None => format!("[^{}]+?", regex::escape(delimiter)),
        };
        let name = match captures.get(3) {
            Some(name) => name.as_str().to_string(),
            None => {
                let name = if unnamed == 0 {
                    PATH_MATCH.to_string()
                } else {
                    unnamed.to_string()
                };
                unnamed += 1;
                name
            }
        };

        keys.push(ParamKey {
            name,
            prefix: prefix.unwrap_or_default().to_string(),
            optional: matches!(modifier, Some("?" | "*")),
            repeat: matches!(modifier, Some("+" | "*")),
            partial,
            asterisk,
            pattern,
        });
        tokens.push(Token::Param(keys.len() - 1));
    }

    if index < source.len() {
        path.push_str(&source[index..]);
    }
    if !path.is_empty() {
        tokens.push(Token::Static(path));
    }
    (tokens, keys)
}

fn build_regex(
    tokens: &[Token],
    keys: &[ParamKey],
    options: PatternOptions,
) -> Result<Regex, regex::Error> {
    let mut route = String::new();
    for token in tokens {
        match token {
            Token::Static(text) => route.push_str(&regex::escape(text)),
            Token::Param(index) => {
                let key = &keys[*index];
                let prefix = regex::escape(&key.prefix);
                let mut capture = format!("(?:{})", key.pattern);
                if key.repeat {
                    capture = format!("{capture}(?:{prefix}{capture})*");
                }
                let capture = match (key.optional, key.partial) {
                    (true, false) => format!("(?:{prefix}({capture}))?"),
                    (true, true) => format!("{prefix}({capture})?"),
                    (false, _) => format!("{prefix}({capture})"),
                };
                route.push_str(&capture);
            }
        }
    }

    if !options.strict {
        let trimmed = route.strip_suffix('/').unwrap_or(&route);
        route = format!("{trimmed}(?:/)?");
    }
    Regex::new(&format!("{}^{route}$", case_flags(options)))
}

fn case_flags(options: PatternOptions) -> &'static str {
    if options.sensitive { "" } else { "(?i)" }
}

const URI_KEPT: [(&str, &str); 13] = [
    ("%3B", ";"),
    ("%2C", ","),
    ("%3A", ":"),
    ("%40", "@"),
    ("%26", "&"),
    ("%3D", "="),
    ("%2B", "+"),
    ("%24", "$"),
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

fn encode_uri(value: &str, keep_slash: bool) -> String {
    let mut encoded = urlencoding::encode(value).into_owned();
    for (escape, raw) in URI_KEPT {
        encoded = encoded.replace(escape, raw);
    }
    if keep_slash {
        encoded = encoded.replace("%2F", "/");
    }
    encoded
}

// Like `encodeURI`, but `/`, `?` and `#` are escaped too.
fn encode_segment(value: &str) -> String {
    encode_uri(value, false)
}

fn encode_asterisk(value: &str) -> String {
    encode_uri(value, true)
}
