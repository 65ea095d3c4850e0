// Typed IR handed to the renderer. Every identifier in here is already renamed
// and case-normalized; nothing downstream should see raw heading or link text.

use serde::{Deserialize, Serialize};

/// Primitive tags a `TypeDescriptor::identifier` may hold instead of an entity name.
pub const PRIMITIVES: &[&str] = &[
    "string", "integer", "float", "boolean", "timestamp", "snowflake", "dict", "mixed", "null",
];

pub fn is_primitive(identifier: &str) -> bool {
    PRIMITIVES.contains(&identifier)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub identifier: String,
    pub nullable: bool,
    pub array: bool,
    pub snowflake_map: bool,
}

impl TypeDescriptor {
    pub fn named(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            nullable: false,
            array: false,
            snowflake_map: false,
        }
    }

    pub fn array_of(identifier: impl Into<String>) -> Self {
        Self { array: true, ..Self::named(identifier) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub optional: bool,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub identifier: String,
    pub fields: Vec<Field>,
}

/// Enum literal: numeric cells are coerced, everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumLiteral {
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: EnumLiteral,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub identifier: String,
    pub values: Vec<EnumValue>,
}

/// `left << right`; `bigint` asks the renderer for an arbitrary-precision left operand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagValue {
    pub name: String,
    pub bigint: bool,
    pub left: String,
    pub right: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub identifier: String,
    pub values: Vec<FlagValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointParams {
    pub identifier: String,
    pub array: bool,
    pub structures: Vec<Structure>,
    /// Deferred "functions the same as" pointer; `identifier` is then a route.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub alias: bool,
}

impl EndpointParams {
    pub fn reference(identifier: impl Into<String>, array: bool) -> Self {
        Self {
            identifier: identifier.into(),
            array,
            structures: Vec::new(),
            alias: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub method: Method,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<EndpointParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<EndpointParams>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayValue {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySection {
    pub identifier: String,
    pub values: Vec<GatewayValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub identifier: String,
    #[serde(default)]
    pub nullable: bool,
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combinator: Option<Combinator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array: Option<bool>,
}

/// `snowflake -> entity` lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMap {
    pub identifier: String,
    pub key: String,
    pub value: String,
}

/// Merged output of a whole docs tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ir {
    pub structures: Vec<Structure>,
    pub enums: Vec<Enum>,
    pub flags: Vec<Flags>,
    pub endpoints: Vec<Endpoint>,
    pub gateway: Vec<GatewaySection>,
    pub aliases: Vec<Alias>,
    pub id_maps: Vec<IdMap>,
}
