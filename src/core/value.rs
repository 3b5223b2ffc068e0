// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Attribute value type system.
//!
//! Attributes carry physical metadata (units, frames, phase centres, WCS
//! headers, provenance). They form a closed recursive value space so that
//! both encoders and the equality check are total over it:
//!
//! scalar | string | array | ordered sequence of values | mapping of string to value

use std::collections::BTreeMap;

use super::array::ArrayData;
use super::error::{CodecError, Result};

/// Attribute mapping, keyed by name.
///
/// Keys are kept sorted so that both encoders emit deterministic output.
pub type Attributes = BTreeMap<String, AttrValue>;

/// A single attribute value.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Dense numeric or string array (e.g. a component flux)
    Array(ArrayData),
    /// Ordered, possibly heterogeneous sequence
    List(Vec<AttrValue>),
    /// Nested mapping
    Map(Attributes),
}

impl PartialEq for AttrValue {
    /// Deep equality; floats compare bit-for-bit except that NaN equals NaN.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Float(a), AttrValue::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (AttrValue::String(a), AttrValue::String(b)) => a == b,
            (AttrValue::Array(a), AttrValue::Array(b)) => a.exact_eq(b),
            (AttrValue::List(a), AttrValue::List(b)) => a == b,
            (AttrValue::Map(a), AttrValue::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl AttrValue {
    /// Get the type name of this value as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Int(_) => "int",
            AttrValue::Float(_) => "float",
            AttrValue::String(_) => "string",
            AttrValue::Array(_) => "array",
            AttrValue::List(_) => "list",
            AttrValue::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayData> {
        match self {
            AttrValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Follow a `/`-separated path through nested mappings.
    ///
    /// See [`lookup_path`] for the path rules.
    pub fn get_path(&self, path: &str) -> Option<&AttrValue> {
        lookup_path(self.as_map()?, path)
    }

    /// Convert to JSON for external collaborators.
    ///
    /// Arrays become `{"dtype", "shape", "data"}` objects with elements as
    /// JSON numbers/strings (complex as `[re, im]` pairs). This is a lossy,
    /// human-oriented view: floats that are not finite become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::Bool(b) => serde_json::Value::Bool(*b),
            AttrValue::Int(i) => serde_json::Value::from(*i),
            AttrValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttrValue::String(s) => serde_json::Value::String(s.clone()),
            AttrValue::Array(a) => array_to_json(a),
            AttrValue::List(items) => {
                serde_json::Value::Array(items.iter().map(AttrValue::to_json).collect())
            }
            AttrValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Convert from JSON.
    ///
    /// Integers that fit `i64` become [`AttrValue::Int`], other numbers
    /// [`AttrValue::Float`]. `null` has no attribute representation.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Err(CodecError::malformed(
                "json",
                "null has no attribute representation",
            )),
            serde_json::Value::Bool(b) => Ok(AttrValue::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(AttrValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(AttrValue::Float(f))
                } else {
                    Err(CodecError::malformed("json", format!("number {n} out of range")))
                }
            }
            serde_json::Value::String(s) => Ok(AttrValue::String(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(AttrValue::from_json)
                .collect::<Result<Vec<_>>>()
                .map(AttrValue::List),
            serde_json::Value::Object(obj) => {
                let mut map = Attributes::new();
                for (key, val) in obj {
                    map.insert(key.clone(), AttrValue::from_json(val)?);
                }
                Ok(AttrValue::Map(map))
            }
        }
    }
}

fn array_to_json(array: &ArrayData) -> serde_json::Value {
    let data: Vec<serde_json::Value> = match array {
        ArrayData::Bool(a) => a.iter().map(|&v| v.into()).collect(),
        ArrayData::String(a) => a.iter().map(|v| v.clone().into()).collect(),
        ArrayData::Complex64(a) => a
            .iter()
            .map(|c| serde_json::json!([c.re as f64, c.im as f64]))
            .collect(),
        ArrayData::Complex128(a) => a.iter().map(|c| serde_json::json!([c.re, c.im])).collect(),
        other => other
            .to_f64_vec()
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                serde_json::Number::from_f64(v)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            })
            .collect(),
    };
    serde_json::json!({
        "dtype": array.dtype().as_str(),
        "shape": array.shape(),
        "data": data,
    })
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::Int(v as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

impl From<ArrayData> for AttrValue {
    fn from(v: ArrayData) -> Self {
        AttrValue::Array(v)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(v: Vec<AttrValue>) -> Self {
        AttrValue::List(v)
    }
}

impl From<Attributes> for AttrValue {
    fn from(v: Attributes) -> Self {
        AttrValue::Map(v)
    }
}

/// Build an [`Attributes`] map from `key => value` pairs.
///
/// ```
/// use radiocodec::attrs;
///
/// let a = attrs! { "units" => "Hz", "nchan" => 4i64 };
/// assert_eq!(a.len(), 2);
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::core::value::Attributes::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::core::value::Attributes::new();
        $( map.insert(($key).to_string(), $crate::core::value::AttrValue::from($value)); )+
        map
    }};
}

/// Resolve a `/`-separated path of keys against a mapping.
///
/// Empty segments are skipped, so `"a//b/"` is `"a/b"`. A path must name at
/// least one key: `""` and `"/"` resolve to nothing.
pub fn lookup_path<'a>(attrs: &'a Attributes, path: &str) -> Option<&'a AttrValue> {
    let mut segments = path.split('/').filter(|seg| !seg.is_empty());
    let first = attrs.get(segments.next()?)?;
    segments.try_fold(first, |node, seg| node.as_map()?.get(seg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_path() {
        let inner = crate::attrs! { "ra" => 180.0, "dec" => -35.0 };
        let root = AttrValue::Map(crate::attrs! { "phasecentre" => inner });
        assert_eq!(
            root.get_path("phasecentre/ra").and_then(AttrValue::as_f64),
            Some(180.0)
        );
        assert!(root.get_path("phasecentre/missing").is_none());
        assert!(root.get_path("phasecentre/ra/deeper").is_none());
        assert_eq!(
            root.get_path("/phasecentre//dec/").and_then(AttrValue::as_f64),
            Some(-35.0)
        );
        assert!(root.get_path("").is_none());
        assert!(root.get_path("/").is_none());
        assert!(AttrValue::Int(1).get_path("").is_none());
    }

    #[test]
    fn test_nan_equality() {
        assert_eq!(AttrValue::Float(f64::NAN), AttrValue::Float(f64::NAN));
        assert_ne!(AttrValue::Float(1.0), AttrValue::Int(1));
    }

    #[test]
    fn test_empty_map_is_not_absent() {
        let a = crate::attrs! { "meta" => Attributes::new() };
        assert_eq!(a.get("meta"), Some(&AttrValue::Map(Attributes::new())));
    }

    #[test]
    fn test_json_bridge() {
        let json = serde_json::json!({
            "name": "MID",
            "location": {"x": 5109237.7, "y": 2006795.6},
            "stations": [1, 2, 3],
            "fixed": true
        });
        let value = AttrValue::from_json(&json).unwrap();
        assert_eq!(value.get_path("name").and_then(AttrValue::as_str), Some("MID"));
        assert_eq!(
            value.get_path("stations").and_then(AttrValue::as_list).map(|l| l.len()),
            Some(3)
        );
        assert_eq!(value.to_json(), json);
        assert!(AttrValue::from_json(&serde_json::Value::Null).is_err());
    }

    #[test]
    fn test_array_to_json() {
        let value = AttrValue::Array(ArrayData::vector(vec![1.5f64, 2.5]));
        let json = value.to_json();
        assert_eq!(json["dtype"], "float64");
        assert_eq!(json["shape"], serde_json::json!([2]));
        assert_eq!(json["data"], serde_json::json!([1.5, 2.5]));
    }
}
