//! Query-string parsing and serialization.
//!
//! Queries are ordered by key so serialization is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed query map.
pub type Query = BTreeMap<String, QueryValue>;

/// A single query value: a bare key, a string, or a repeated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    /// `?flag` with no `=`.
    Null,
    /// `?key=value`.
    Single(String),
    /// `?key=a&key=b`. `None` entries are bare keys.
    List(Vec<Option<String>>),
}

impl QueryValue {
    /// The first value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Null => None,
            QueryValue::Single(value) => Some(value),
            QueryValue::List(values) => values.iter().flatten().next().map(String::as_str),
        }
    }

    fn from_option(value: Option<String>) -> Self {
        match value {
            Some(value) => QueryValue::Single(value),
            None => QueryValue::Null,
        }
    }

    fn into_option(self) -> Option<String> {
        match self {
            QueryValue::Single(value) => Some(value),
            _ => None,
        }
    }

    fn push(self, value: Option<String>) -> Self {
        match self {
            QueryValue::List(mut values) => {
                values.push(value);
                QueryValue::List(values)
            }
            single => QueryValue::List(vec![single.into_option(), value]),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Option<String>> for QueryValue {
    fn from(value: Option<String>) -> Self {
        QueryValue::from_option(value)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::List(values.into_iter().map(|v| Some(v.to_string())).collect())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        QueryValue::List(values.into_iter().map(Some).collect())
    }
}

macro_rules! stringified_query_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Single(value.to_string())
                }
            }
        )+
    };
}

stringified_query_value!(bool, i32, i64, u32, u64, usize, f64);

/// Percent-encode a query component.
///
/// Matches `encodeURIComponent` with `!'()*` escaped and `,` kept.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).replace("%2C", ",")
}

/// Percent-decode a component, returning the input unchanged when it is malformed.
pub fn decode(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value.to_string(),
    }
}

/// Parse a query string. A leading `?`, `#` or `&` is ignored.
pub fn parse_query(query: &str) -> Query {
    let mut res = Query::new();
    let query = query.trim();
    let query = query.strip_prefix(['?', '#', '&']).unwrap_or(query);

    for param in query.split('&').filter(|p| !p.is_empty()) {
        let param = param.replace('+', " ");
        let (key, value) = match param.split_once('=') {
            Some((key, value)) => (decode(key), Some(decode(value))),
            None => (decode(&param), None),
        };

        let entry = match res.remove(&key) {
            Some(existing) => existing.push(value),
            None => QueryValue::from_option(value),
        };
        res.insert(key, entry);
    }
    res
}

/// Serialize a query map, including the leading `?` when non-empty.
pub fn stringify_query(query: &Query) -> String {
    let parts: Vec<String> = query
        .iter()
        .map(|(key, value)| match value {
            QueryValue::Null => encode(key),
            QueryValue::Single(value) => format!("{}={}", encode(key), encode(value)),
            QueryValue::List(values) => values
                .iter()
                .map(|value| match value {
                    Some(value) => format!("{}={}", encode(key), encode(value)),
                    None => encode(key),
                })
                .collect::<Vec<_>>()
                .join("&"),
        })
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Parse `query` and overlay `extra` on top of it; `extra` wins on conflicts.
pub fn resolve_query(query: &str, extra: Option<&Query>) -> Query {
    let mut parsed = parse_query(query);
    if let Some(extra) = extra {
        for (key, value) in extra {
            parsed.insert(key.clone(), value.clone());
        }
    }
    parsed
}
