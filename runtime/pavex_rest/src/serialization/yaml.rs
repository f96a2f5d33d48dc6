use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::errors::{BoxError, DecodeError, EncodeError};
use super::{APPLICATION_YAML, FormatCodec, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Layout options for the documents emitted by [`YamlCodec`].
pub struct YamlCodecConfig {
    /// The nesting level at which the emitter switches from block style
    /// to flow (inline) style.
    ///
    /// The top-level value sits at level 0.
    /// Collections nested shallower than `inline_depth` are written in block style,
    /// everything at or below that level is written on a single line.
    /// With `inline_depth` set to 0 the whole document is written in flow style.
    ///
    /// Defaults to 4.
    pub inline_depth: usize,
    /// The number of spaces used for each level of indentation in block style.
    ///
    /// Defaults to 2.
    pub indentation: NonZeroUsize,
}

impl YamlCodecConfig {
    /// The default value for [`YamlCodecConfig::inline_depth`].
    pub const DEFAULT_INLINE_DEPTH: usize = 4;
    /// The default value for [`YamlCodecConfig::indentation`].
    pub const DEFAULT_INDENTATION: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1);
}

impl Default for YamlCodecConfig {
    fn default() -> Self {
        Self {
            inline_depth: Self::DEFAULT_INLINE_DEPTH,
            indentation: Self::DEFAULT_INDENTATION,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
/// Encode and decode `application/yaml` documents, using `serde_yaml`.
///
/// # Decoding
///
/// YAML is more expressive than the value model shared by all codecs.
/// When decoding:
///
/// - scalar mapping keys (strings, numbers, booleans) are converted to strings;
/// - `null` keys and collection keys are rejected;
/// - tags are dropped, the tagged value is kept;
/// - `.nan` and `.inf` are rejected, since they can't be represented;
/// - an empty document decodes to `null`.
///
/// # Encoding
///
/// Collections are written in block style until the nesting level reaches
/// [`YamlCodecConfig::inline_depth`]; deeper collections are written in flow style.
///
/// ```rust
/// use pavex_rest::serialization::{FormatCodec, YamlCodec, YamlCodecConfig};
/// use serde_json::json;
///
/// let codec = YamlCodec::new(YamlCodecConfig {
///     inline_depth: 1,
///     ..Default::default()
/// });
/// let document = codec.encode(&json!({ "name": "pavex", "tags": ["a", "b"] })).unwrap();
/// assert_eq!(document, b"name: pavex\ntags: [a, b]\n");
/// ```
pub struct YamlCodec {
    config: YamlCodecConfig,
}

impl YamlCodec {
    /// Create a new [`YamlCodec`] with the given layout options.
    pub fn new(config: YamlCodecConfig) -> Self {
        Self { config }
    }

    /// The layout options used by this codec.
    pub fn config(&self) -> &YamlCodecConfig {
        &self.config
    }

    fn dump(&self, value: &Value) -> Result<String, BoxError> {
        let mut out = String::new();
        if self.config.inline_depth == 0 || !is_block(value) {
            out.push_str(&flow(value)?);
            out.push('\n');
        } else {
            self.block(value, self.config.inline_depth, 0, &mut out)?;
        }
        Ok(out)
    }

    /// Write a non-empty collection in block style.
    ///
    /// `remaining` is the number of levels, including this one, that can still be written
    /// in block style.
    fn block(
        &self,
        value: &Value,
        remaining: usize,
        indent: usize,
        out: &mut String,
    ) -> Result<(), BoxError> {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.entry(Some(key.as_str()), child, remaining, indent, out)?;
                }
            }
            Value::Array(items) => {
                for child in items {
                    self.entry(None, child, remaining, indent, out)?;
                }
            }
            _ => return Err("only collections can be written in block style".into()),
        }
        Ok(())
    }

    /// Write a single mapping entry (`key: ...`) or sequence item (`- ...`).
    fn entry(
        &self,
        key: Option<&str>,
        child: &Value,
        remaining: usize,
        indent: usize,
        out: &mut String,
    ) -> Result<(), BoxError> {
        out.extend(std::iter::repeat_n(' ', indent));
        match key {
            Some(key) => {
                let key = scalar(key)?;
                if is_implicit_key(&key) {
                    out.push_str(&key);
                } else {
                    out.push_str("? ");
                    out.push_str(&key);
                    out.push('\n');
                    out.extend(std::iter::repeat_n(' ', indent));
                }
                out.push(':');
            }
            None => out.push('-'),
        }
        if remaining <= 1 || !is_block(child) {
            out.push(' ');
            out.push_str(&flow(child)?);
            out.push('\n');
            return Ok(());
        }
        out.push('\n');
        self.block(
            child,
            remaining - 1,
            indent + self.config.indentation.get(),
            out,
        )
    }
}

impl FormatCodec for YamlCodec {
    fn mime_type(&self) -> &str {
        APPLICATION_YAML
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        self.dump(value)
            .map(String::into_bytes)
            .map_err(|e| EncodeError::new(APPLICATION_YAML, e))
    }

    fn decode(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        let document: serde_yaml::Value =
            serde_yaml::from_slice(raw).map_err(|e| DecodeError::new(APPLICATION_YAML, e))?;
        from_yaml(document).map_err(|e| DecodeError::new(APPLICATION_YAML, e))
    }
}

/// Only non-empty collections get a block of their own.
fn is_block(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

fn flow(value: &Value) -> Result<String, BoxError> {
    Ok(match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => scalar(s)?,
        Value::Array(items) => {
            let items = items.iter().map(flow).collect::<Result<Vec<_>, _>>()?;
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_owned(),
        Value::Object(map) => {
            let entries = map
                .iter()
                .map(|(k, v)| {
                    let (key, value) = (scalar(k)?, flow(v)?);
                    Ok(if is_implicit_key(&key) {
                        format!("{key}: {value}")
                    } else {
                        format!("? {key} : {value}")
                    })
                })
                .collect::<Result<Vec<_>, BoxError>>()?;
            format!("{{ {} }}", entries.join(", "))
        }
    })
}

/// Parsers give up on implicit keys (`key: value`) longer than this, measured in characters.
const MAX_IMPLICIT_KEY_LENGTH: usize = 1024;

/// Keys that are too long must be written as explicit keys (`? key`).
fn is_implicit_key(rendered: &str) -> bool {
    rendered.chars().count() < MAX_IMPLICIT_KEY_LENGTH
}

/// Render a string scalar so that it can be used both as a key and as a flow item.
///
/// `serde_yaml` takes care of quoting strings that would otherwise be read back
/// as something else (`'1'`, `'true'`, `''`, ...).
/// It doesn't know about flow context though, so we fall back to a double-quoted scalar
/// for anything that contains flow indicators, line breaks or non-printable characters.
fn scalar(s: &str) -> Result<String, BoxError> {
    if s.chars().any(must_be_escaped) {
        return Ok(double_quoted(s));
    }
    let rendered = serde_yaml::to_string(s)?;
    let rendered = rendered.strip_suffix('\n').unwrap_or(&rendered);
    if rendered.contains(['\n', ',', '[', ']', '{', '}', '#']) {
        return Ok(double_quoted(s));
    }
    Ok(rendered.to_owned())
}

/// Control characters, plus the Unicode line and paragraph separators: YAML reads them
/// as line breaks, or refuses them outright, unless they are escaped.
fn must_be_escaped(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if must_be_escaped(c) => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn from_yaml(value: serde_yaml::Value) -> Result<Value, BoxError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(n) = n.as_u64() {
                Value::from(n)
            } else if let Some(n) = n.as_i64() {
                Value::from(n)
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("`{n}` can't be represented as a finite number"))?
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_from_yaml(key)?, from_yaml(value)?);
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

fn key_from_yaml(key: serde_yaml::Value) -> Result<String, BoxError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => key_from_yaml(tagged.value),
        serde_yaml::Value::Null => Err("mapping keys can't be null".into()),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => {
            Err("mapping keys must be scalars".into())
        }
    }
}
