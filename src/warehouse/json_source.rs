//! Reading JSON documents for local bulk loads.
//!
//! Sources are a single file or a directory tree of `*.json` files, each
//! holding one or more concatenated JSON objects. Columns are filled either by
//! matching object keys to column names or through a jsonpaths file.

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::types::Value as SqlValue;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// A JSONPath expression restricted to member and index access, e.g.
/// `$['artist']`, `$.song.title` or `$["tags"][0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    pub fn parse(expr: &str) -> Result<Self> {
        let mut rest = expr
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| anyhow!("JSONPath expression must start with '$': {}", expr))?;
        let mut segments = Vec::new();
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('.') {
                let end = after.find(|c: char| c == '.' || c == '[').unwrap_or(after.len());
                let key = &after[..end];
                if key.is_empty() {
                    bail!("Empty member name in JSONPath expression: {}", expr);
                }
                segments.push(PathSegment::Key(key.to_string()));
                rest = &after[end..];
            } else if let Some(after) = rest.strip_prefix('[') {
                let after = after.trim_start();
                match after.chars().next() {
                    Some(quote @ ('\'' | '"')) => {
                        let body = &after[1..];
                        let end = body.find(quote).ok_or_else(|| {
                            anyhow!("Unterminated member name in JSONPath expression: {}", expr)
                        })?;
                        segments.push(PathSegment::Key(body[..end].to_string()));
                        rest = body[end + 1..]
                            .trim_start()
                            .strip_prefix(']')
                            .ok_or_else(|| anyhow!("Expected ']' in JSONPath expression: {}", expr))?;
                    }
                    _ => {
                        let end = after
                            .find(']')
                            .ok_or_else(|| anyhow!("Expected ']' in JSONPath expression: {}", expr))?;
                        let index = after[..end].trim().parse::<usize>().with_context(|| {
                            format!("Invalid array index in JSONPath expression: {}", expr)
                        })?;
                        segments.push(PathSegment::Index(index));
                        rest = &after[end + 1..];
                    }
                }
            } else {
                bail!("Unexpected character in JSONPath expression: {}", expr);
            }
        }
        Ok(Self { segments })
    }

    pub fn select<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| match segment {
                PathSegment::Key(key) => current.get(key.as_str()),
                PathSegment::Index(index) => current.get(*index),
            })
    }
}

#[derive(Deserialize)]
struct JsonPathsFile {
    jsonpaths: Vec<String>,
}

/// How document values are assigned to table columns.
pub enum ColumnMapping {
    /// Object keys matched to column names, ignoring ASCII case.
    Auto,
    /// One path per column, in column order.
    Paths(Vec<JsonPath>),
}

impl ColumnMapping {
    pub fn from_jsonpaths_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read jsonpaths file: {:?}", path))?;
        let file: JsonPathsFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse jsonpaths file: {:?}", path))?;
        let paths = file
            .jsonpaths
            .iter()
            .map(|expr| JsonPath::parse(expr))
            .collect::<Result<Vec<_>>>()?;
        Ok(ColumnMapping::Paths(paths))
    }

    /// Values of one document for `columns`; missing values become NULL.
    pub fn extract(&self, document: &Value, columns: &[&str]) -> Result<Vec<SqlValue>> {
        match self {
            ColumnMapping::Auto => {
                let object = document
                    .as_object()
                    .ok_or_else(|| anyhow!("Expected a JSON object, found: {}", document))?;
                Ok(columns
                    .iter()
                    .map(|column| {
                        let value = object
                            .iter()
                            .find(|(key, _)| key.eq_ignore_ascii_case(column))
                            .map(|(_, value)| value);
                        to_sql_value(value)
                    })
                    .collect())
            }
            ColumnMapping::Paths(paths) => {
                if paths.len() != columns.len() {
                    bail!(
                        "jsonpaths file has {} expressions but {} columns are loaded",
                        paths.len(),
                        columns.len()
                    );
                }
                Ok(paths
                    .iter()
                    .map(|path| to_sql_value(path.select(document)))
                    .collect())
            }
        }
    }
}

fn to_sql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(other) => SqlValue::Text(other.to_string()),
    }
}

/// Files to load for `source`, sorted by path.
pub fn source_files(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if !source.is_dir() {
        bail!("Bulk-load source not found: {:?}", source);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", source))?;
        let is_json = entry
            .path()
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Every JSON document in `file`, in file order.
pub fn read_documents(file: &Path) -> Result<Vec<Value>> {
    let content =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    serde_json::Deserializer::from_str(&content)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid JSON in {:?}", file))
}
