//! Schema shapes and the schema registry
//!
//! A [`SchemaShape`] is a small JSON-schema-like tree. Named shapes live in a
//! [`SchemaRegistry`] and are referenced from routes and other shapes by
//! [`SchemaShape::Ref`].

use crate::error::{RegistryError, RegistryResult};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;
use utoipa::openapi::schema::{
    AdditionalProperties, ArrayBuilder, ArrayItems, ObjectBuilder, Schema, SchemaFormat, Type,
};
use utoipa::openapi::{Ref, RefOr};

/// Primitive JSON type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Integer,
    Number,
    String,
    Boolean,
}

impl PrimitiveKind {
    fn schema_type(self) -> Type {
        match self {
            PrimitiveKind::Integer => Type::Integer,
            PrimitiveKind::Number => Type::Number,
            PrimitiveKind::String => Type::String,
            PrimitiveKind::Boolean => Type::Boolean,
        }
    }
}

/// One member of an enum: Rust identifier, numeric value and wire string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub ident: String,
    pub value: i64,
    pub wire: String,
}

/// Enum shape serialised as its wire strings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumShape {
    members: Vec<EnumMember>,
}

impl EnumShape {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn member(mut self, ident: &str, value: i64, wire: &str) -> Self {
        self.members.push(EnumMember {
            ident: ident.to_string(),
            value,
            wire: wire.to_string(),
        });
        self
    }

    #[must_use]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Wire strings in declaration order
    #[must_use]
    pub fn wire_values(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.wire.as_str()).collect()
    }

    /// Member identifier to wire string
    #[must_use]
    pub fn to_wire(&self, ident: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.ident == ident)
            .map(|m| m.wire.as_str())
    }

    /// Wire string to member identifier
    #[must_use]
    pub fn from_wire(&self, wire: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.wire == wire)
            .map(|m| m.ident.as_str())
    }

    /// Case-insensitive [`EnumShape::from_wire`]
    #[must_use]
    pub fn from_wire_ignore_case(&self, wire: &str) -> Option<&EnumMember> {
        self.members
            .iter()
            .find(|m| m.wire.eq_ignore_ascii_case(wire))
    }

    /// Checks that identifiers and wire strings are each unique and non-empty.
    pub(crate) fn validate(&self, name: &str) -> RegistryResult<()> {
        let invalid = |reason: String| RegistryError::InvalidEnum {
            name: name.to_string(),
            reason,
        };
        if self.members.is_empty() {
            return Err(invalid("enum has no members".to_string()));
        }
        let mut idents = HashSet::new();
        let mut wires = HashSet::new();
        for member in &self.members {
            if member.ident.is_empty() || member.wire.is_empty() {
                return Err(invalid("member identifiers and wire strings must not be empty".to_string()));
            }
            if !idents.insert(member.ident.as_str()) {
                return Err(invalid(format!("identifier '{}' appears twice", member.ident)));
            }
            if !wires.insert(member.wire.as_str()) {
                return Err(invalid(format!("wire string '{}' appears twice", member.wire)));
            }
        }
        Ok(())
    }
}

/// A named field of an object shape
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub shape: SchemaShape,
    pub required: bool,
    pub description: Option<String>,
}

/// Object shape with ordered fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    pub fields: IndexMap<String, FieldShape>,
}

impl ObjectShape {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: &str, shape: SchemaShape) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldShape {
                shape,
                required: false,
                description: None,
            },
        );
        self
    }

    #[must_use]
    pub fn required_field(mut self, name: &str, shape: SchemaShape) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldShape {
                shape,
                required: true,
                description: None,
            },
        );
        self
    }
}

/// JSON-schema-like shape
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaShape {
    Primitive {
        kind: PrimitiveKind,
        format: Option<String>,
    },
    Enum(EnumShape),
    Object(ObjectShape),
    Array(Box<SchemaShape>),
    Map(Box<SchemaShape>),
    Ref(String),
}

impl SchemaShape {
    fn primitive(kind: PrimitiveKind, format: Option<&str>) -> Self {
        SchemaShape::Primitive {
            kind,
            format: format.map(str::to_string),
        }
    }

    #[must_use]
    pub fn int32() -> Self {
        Self::primitive(PrimitiveKind::Integer, Some("int32"))
    }

    #[must_use]
    pub fn int64() -> Self {
        Self::primitive(PrimitiveKind::Integer, Some("int64"))
    }

    #[must_use]
    pub fn number() -> Self {
        Self::primitive(PrimitiveKind::Number, Some("double"))
    }

    #[must_use]
    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String, None)
    }

    #[must_use]
    pub fn date_time() -> Self {
        Self::primitive(PrimitiveKind::String, Some("date-time"))
    }

    #[must_use]
    pub fn binary() -> Self {
        Self::primitive(PrimitiveKind::String, Some("binary"))
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::primitive(PrimitiveKind::Boolean, None)
    }

    #[must_use]
    pub fn array_of(item: SchemaShape) -> Self {
        SchemaShape::Array(Box::new(item))
    }

    #[must_use]
    pub fn map_of(value: SchemaShape) -> Self {
        SchemaShape::Map(Box::new(value))
    }

    #[must_use]
    pub fn reference(name: &str) -> Self {
        SchemaShape::Ref(name.to_string())
    }

    /// Appends every ref name in this shape to `out`
    pub fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SchemaShape::Primitive { .. } | SchemaShape::Enum(_) => {}
            SchemaShape::Object(obj) => {
                for field in obj.fields.values() {
                    field.shape.collect_refs(out);
                }
            }
            SchemaShape::Array(inner) | SchemaShape::Map(inner) => inner.collect_refs(out),
            SchemaShape::Ref(name) => out.push(name.as_str()),
        }
    }

    /// Converts the shape into an OpenAPI schema
    ///
    /// Named shapes become `$ref`s into `#/components/schemas`. A field
    /// description is only kept on inline object schemas; a `$ref` carries
    /// no siblings.
    #[must_use]
    pub fn to_openapi(&self) -> RefOr<Schema> {
        match self {
            SchemaShape::Primitive { kind, format } => object_schema(
                ObjectBuilder::new()
                    .schema_type(kind.schema_type())
                    .format(format.clone().map(SchemaFormat::Custom)),
            ),
            SchemaShape::Enum(shape) => object_schema(
                ObjectBuilder::new()
                    .schema_type(Type::String)
                    .enum_values(Some(shape.wire_values())),
            ),
            SchemaShape::Object(obj) => {
                let mut builder = ObjectBuilder::new().schema_type(Type::Object);
                for (name, field) in &obj.fields {
                    let schema = with_description(field.shape.to_openapi(), field.description.as_deref());
                    builder = builder.property(name, schema);
                    if field.required {
                        builder = builder.required(name);
                    }
                }
                object_schema(builder)
            }
            SchemaShape::Array(item) => RefOr::T(Schema::Array(
                ArrayBuilder::new()
                    .items(ArrayItems::RefOrSchema(Box::new(item.to_openapi())))
                    .build(),
            )),
            SchemaShape::Map(value) => object_schema(
                ObjectBuilder::new()
                    .schema_type(Type::Object)
                    .additional_properties(Some(AdditionalProperties::RefOr(value.to_openapi()))),
            ),
            SchemaShape::Ref(name) => RefOr::Ref(Ref::new(format!("#/components/schemas/{name}"))),
        }
    }
}

fn object_schema(builder: ObjectBuilder) -> RefOr<Schema> {
    RefOr::T(Schema::Object(builder.build()))
}

/// Sets `description` on an inline object schema; other schemas pass through
pub(crate) fn with_description(schema: RefOr<Schema>, description: Option<&str>) -> RefOr<Schema> {
    match (schema, description) {
        (RefOr::T(Schema::Object(mut obj)), Some(text)) => {
            obj.description = Some(text.to_string());
            RefOr::T(Schema::Object(obj))
        }
        (schema, _) => schema,
    }
}

impl From<ObjectShape> for SchemaShape {
    fn from(obj: ObjectShape) -> Self {
        SchemaShape::Object(obj)
    }
}

impl From<EnumShape> for SchemaShape {
    fn from(shape: EnumShape) -> Self {
        SchemaShape::Enum(shape)
    }
}

/// A named shape
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub name: String,
    pub description: Option<String>,
    pub shape: SchemaShape,
}

/// Append-only map of schema name to shape, in registration order
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entries: IndexMap<String, SchemaEntry>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named shape
    ///
    /// Fails with `DuplicateSchema` on a name collision, `InvalidEnum` when an
    /// enum is not bijective and `DanglingReference` when a nested ref does not
    /// resolve. An object may refer to its own name.
    pub fn register(&mut self, name: &str, shape: SchemaShape) -> RegistryResult<()> {
        self.register_entry(SchemaEntry {
            name: name.to_string(),
            description: None,
            shape,
        })
    }

    pub fn register_entry(&mut self, entry: SchemaEntry) -> RegistryResult<()> {
        if self.entries.contains_key(&entry.name) {
            return Err(RegistryError::DuplicateSchema { name: entry.name });
        }
        if let SchemaShape::Enum(shape) = &entry.shape {
            shape.validate(&entry.name)?;
        }
        let mut refs = Vec::new();
        entry.shape.collect_refs(&mut refs);
        for reference in refs {
            if reference != entry.name && !self.entries.contains_key(reference) {
                return Err(RegistryError::DanglingReference {
                    origin: entry.name.clone(),
                    reference: reference.to_string(),
                });
            }
        }
        debug!(schema = %entry.name, "registered schema");
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Look up a shape by name, failing with `UnknownSchema`
    pub fn resolve(&self, name: &str) -> RegistryResult<&SchemaEntry> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownSchema {
                name: name.to_string(),
            })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Enum shape registered under `name`, if that entry is an enum
    #[must_use]
    pub fn enum_shape(&self, name: &str) -> Option<&EnumShape> {
        match self.entries.get(name).map(|e| &e.shape) {
            Some(SchemaShape::Enum(shape)) => Some(shape),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
