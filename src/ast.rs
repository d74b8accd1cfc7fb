// Author: laravel-cfg contributors
// License: MIT

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A literal scalar found in PHP source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Renders the scalar the way PHP would cast it to a string,
    /// except that `null`, `true` and `false` are spelled out.
    pub fn to_php_string(&self) -> String {
        match self {
            Scalar::Null => "null".into(),
            Scalar::Bool(true) => "true".into(),
            Scalar::Bool(false) => "false".into(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => format_float(*f),
            Scalar::String(s) => s.clone(),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Key of a PHP array entry. String and integer keys may be mixed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::Str(s.to_string())
    }
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

/// Ordered key/value container mirroring a PHP array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    entries: IndexMap<ArrayKey, ValueNode>,
    /// `None` once `i64::MAX` has been used as a key.
    next_index: Option<i64>,
}

impl Default for Mapping {
    fn default() -> Self {
        Self { entries: IndexMap::new(), next_index: Some(0) }
    }
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under an explicit key. A repeated key replaces the old value
    /// but keeps its original position.
    pub fn insert(&mut self, key: ArrayKey, value: ValueNode) {
        if let ArrayKey::Int(i) = key {
            if self.next_index.is_some_and(|next| i >= next) {
                self.next_index = i.checked_add(1);
            }
        }
        self.entries.insert(key, value);
    }

    /// Insert under the next free integer index (`$a[] = ...`).
    ///
    /// After `i64::MAX` has been used as a key there is no next index and
    /// the value is dropped.
    pub fn push(&mut self, value: ValueNode) {
        match self.next_index {
            Some(next) => self.insert(ArrayKey::Int(next), value),
            None => tracing::debug!(value = %value, "no free integer index left, element dropped"),
        }
    }

    /// Lookup by string key only.
    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.entries.get(&ArrayKey::Str(key.to_string()))
    }

    pub fn get_key(&self, key: &ArrayKey) -> Option<&ValueNode> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &ValueNode)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &ValueNode> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An unevaluated function invocation, e.g. `env('APP_NAME', 'my-app')`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<ValueNode>,
}

impl FuncCall {
    pub fn new(name: impl Into<String>, args: Vec<ValueNode>) -> Self {
        Self { name: name.into(), args }
    }

    /// True when the call is `name(...)` and, if `first_arg` is given, the
    /// first argument is exactly that string literal.
    pub fn is_call(&self, name: &str, first_arg: Option<&str>) -> bool {
        if self.name != name {
            return false;
        }
        match first_arg {
            None => true,
            Some(expected) => matches!(
                self.first_arg(),
                Some(ValueNode::Scalar(Scalar::String(s))) if s == expected
            ),
        }
    }

    pub fn first_arg(&self) -> Option<&ValueNode> {
        self.args.first()
    }

    pub fn second_arg(&self) -> Option<&ValueNode> {
        self.args.get(1)
    }
}

/// Semantic value of a PHP configuration expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Scalar(Scalar),
    Mapping(Mapping),
    FuncCall(FuncCall),
    ClassConst { class: String, constant: String },
    StaticProp { class: String, property: String },
    /// An expression shape that is not modeled; validators treat it as unknown.
    Unparsed { origin_kind: String },
}

impl ValueNode {
    pub fn string(s: impl Into<String>) -> Self {
        ValueNode::Scalar(Scalar::String(s.into()))
    }

    pub fn unparsed(kind: impl Into<String>) -> Self {
        ValueNode::Unparsed { origin_kind: kind.into() }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        if let ValueNode::Mapping(m) = self { Some(m) } else { None }
    }

    pub fn as_func_call(&self) -> Option<&FuncCall> {
        if let ValueNode::FuncCall(c) = self { Some(c) } else { None }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        if let ValueNode::Scalar(s) = self { Some(s) } else { None }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let ValueNode::Scalar(Scalar::String(s)) = self { Some(s) } else { None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let ValueNode::Scalar(Scalar::Bool(b)) = self { Some(*b) } else { None }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ValueNode::Scalar(Scalar::Null))
    }

    /// Shorthand for `as_func_call().is_some_and(|c| c.is_call(..))`.
    pub fn is_call(&self, name: &str, first_arg: Option<&str>) -> bool {
        self.as_func_call().is_some_and(|c| c.is_call(name, first_arg))
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            ValueNode::Scalar(Scalar::Null) => "null",
            ValueNode::Scalar(Scalar::Bool(_)) => "bool",
            ValueNode::Scalar(Scalar::Int(_)) => "int",
            ValueNode::Scalar(Scalar::Float(_)) => "float",
            ValueNode::Scalar(Scalar::String(_)) => "string",
            ValueNode::Mapping(_) => "array",
            ValueNode::FuncCall(_) => "function call",
            ValueNode::ClassConst { .. } => "class constant",
            ValueNode::StaticProp { .. } => "static property",
            ValueNode::Unparsed { origin_kind } => origin_kind,
        }
    }
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// PHP-like source rendering: strings are single-quoted, calls keep their
/// arguments, unmodeled expressions show their kind.
impl fmt::Display for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueNode::Scalar(Scalar::String(s)) => write!(f, "'{}'", s.replace('\'', "\\'")),
            ValueNode::Scalar(other) => write!(f, "{}", other.to_php_string()),
            ValueNode::Mapping(m) => {
                write!(f, "[")?;
                for (i, (key, value)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match key {
                        ArrayKey::Int(k) => write!(f, "{} => {}", k, value)?,
                        ArrayKey::Str(k) => write!(f, "'{}' => {}", k, value)?,
                    }
                }
                write!(f, "]")
            }
            ValueNode::FuncCall(call) => write!(f, "{}", call),
            ValueNode::ClassConst { class, constant } => write!(f, "{}::{}", class, constant),
            ValueNode::StaticProp { class, property } => write!(f, "{}::${}", class, property),
            ValueNode::Unparsed { origin_kind } => write!(f, "<{}>", origin_kind),
        }
    }
}

impl From<Scalar> for ValueNode {
    fn from(s: Scalar) -> Self {
        ValueNode::Scalar(s)
    }
}

impl From<Mapping> for ValueNode {
    fn from(m: Mapping) -> Self {
        ValueNode::Mapping(m)
    }
}

impl From<FuncCall> for ValueNode {
    fn from(c: FuncCall) -> Self {
        ValueNode::FuncCall(c)
    }
}
