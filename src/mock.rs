//! Schema-driven fixture generator
//!
//! [`MockGenerator`] walks registered [`SchemaShape`]s and produces JSON that
//! conforms to them. Everything is drawn from a seeded [`StdRng`], so a given
//! seed always produces the same payloads.

use crate::error::{RegistryError, RegistryResult};
use crate::openapi::{PrimitiveKind, SchemaRegistry, SchemaShape};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};

/// Number of items generated for arrays and maps
pub const COLLECTION_SIZE: usize = 3;

/// Nesting depth past which objects become `null` and collections empty
pub const MAX_DEPTH: usize = 5;

// 2020-01-01T00:00:00Z
const DATE_BASE: i64 = 1_577_836_800;
const DATE_SPAN: i64 = 5 * 365 * 24 * 60 * 60;

pub struct MockGenerator<'a> {
    schemas: &'a SchemaRegistry,
    rng: StdRng,
}

impl<'a> MockGenerator<'a> {
    #[must_use]
    pub fn new(schemas: &'a SchemaRegistry, seed: u64) -> Self {
        Self {
            schemas,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a value for an arbitrary shape
    pub fn generate(&mut self, shape: &SchemaShape) -> RegistryResult<Value> {
        self.generate_at(shape, "", 0)
    }

    /// Generate a value for the schema registered under `name`
    pub fn generate_named(&mut self, name: &str) -> RegistryResult<Value> {
        let schemas = self.schemas;
        let entry = schemas.resolve(name)?;
        self.generate_at(&entry.shape, name, 0)
    }

    /// `count` values of the schema registered under `name`
    pub fn generate_many(&mut self, name: &str, count: usize) -> RegistryResult<Vec<Value>> {
        (0..count).map(|_| self.generate_named(name)).collect()
    }

    /// Start building a named object whose top-level fields can be overridden
    ///
    /// ```ignore
    /// let pet = mock.build("Pet").with_override("id", json!(42)).create()?;
    /// ```
    pub fn build(&mut self, name: &str) -> MockBuilder<'_, 'a> {
        MockBuilder {
            generator: self,
            name: name.to_string(),
            overrides: Vec::new(),
        }
    }

    /// Random int32 in `1..=255`
    pub fn int32(&mut self) -> i32 {
        self.rng.gen_range(1..=255)
    }

    /// `hint` followed by a random GUID-like suffix
    pub fn string(&mut self, hint: &str) -> String {
        let a: u32 = self.rng.gen();
        let b: u16 = self.rng.gen();
        let c: u16 = self.rng.gen();
        let d: u16 = self.rng.gen();
        let e: u64 = self.rng.gen::<u64>() & 0xffff_ffff_ffff;
        format!("{hint}{a:08x}-{b:04x}-{c:04x}-{d:04x}-{e:012x}")
    }

    /// RFC 3339 UTC timestamp between 2020 and 2025
    pub fn date_time(&mut self) -> String {
        let secs = DATE_BASE + self.rng.gen_range(0..DATE_SPAN);
        DateTime::<Utc>::from_timestamp(secs, 0)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn generate_at(&mut self, shape: &SchemaShape, hint: &str, depth: usize) -> RegistryResult<Value> {
        let value = match shape {
            SchemaShape::Primitive { kind, format } => self.primitive(*kind, format.as_deref(), hint),
            SchemaShape::Enum(shape) => {
                let members = shape.members();
                if members.is_empty() {
                    Value::Null
                } else {
                    let idx = self.rng.gen_range(0..members.len());
                    Value::String(members[idx].wire.clone())
                }
            }
            SchemaShape::Object(obj) => {
                if depth >= MAX_DEPTH {
                    return Ok(Value::Null);
                }
                let mut out = Map::new();
                for (name, field) in &obj.fields {
                    out.insert(name.clone(), self.generate_at(&field.shape, name, depth + 1)?);
                }
                Value::Object(out)
            }
            SchemaShape::Array(item) => {
                if depth >= MAX_DEPTH {
                    return Ok(Value::Array(Vec::new()));
                }
                let mut items = Vec::with_capacity(COLLECTION_SIZE);
                for _ in 0..COLLECTION_SIZE {
                    items.push(self.generate_at(item, hint, depth + 1)?);
                }
                Value::Array(items)
            }
            SchemaShape::Map(value) => {
                if depth >= MAX_DEPTH {
                    return Ok(Value::Object(Map::new()));
                }
                let mut out = Map::new();
                for _ in 0..COLLECTION_SIZE {
                    let key = self.string("key");
                    out.insert(key, self.generate_at(value, hint, depth + 1)?);
                }
                Value::Object(out)
            }
            SchemaShape::Ref(name) => {
                if depth >= MAX_DEPTH {
                    return Ok(Value::Null);
                }
                let schemas = self.schemas;
                let entry = schemas.resolve(name)?;
                let hint = if hint.is_empty() { name.as_str() } else { hint };
                self.generate_at(&entry.shape, hint, depth + 1)?
            }
        };
        Ok(value)
    }

    fn primitive(&mut self, kind: PrimitiveKind, format: Option<&str>, hint: &str) -> Value {
        match (kind, format) {
            (PrimitiveKind::Integer, Some("int64")) => {
                Value::from(self.rng.gen_range(1..=i64::from(i32::MAX)))
            }
            (PrimitiveKind::Integer, _) => Value::from(self.int32()),
            (PrimitiveKind::Number, _) => {
                let cents: u32 = self.rng.gen_range(1..=100_000);
                Value::from(f64::from(cents) / 100.0)
            }
            (PrimitiveKind::Boolean, _) => Value::Bool(self.rng.gen_bool(0.5)),
            (PrimitiveKind::String, Some("date-time")) => Value::String(self.date_time()),
            (PrimitiveKind::String, Some("binary")) => Value::String(format!("{hint}-content")),
            (PrimitiveKind::String, _) => Value::String(self.string(hint)),
        }
    }
}

/// Pending generation of a named schema with field overrides
pub struct MockBuilder<'g, 'a> {
    generator: &'g mut MockGenerator<'a>,
    name: String,
    overrides: Vec<(String, Value)>,
}

impl MockBuilder<'_, '_> {
    /// Replace a top-level field after generation
    #[must_use]
    pub fn with_override(mut self, field: &str, value: Value) -> Self {
        self.overrides.push((field.to_string(), value));
        self
    }

    /// Generate the value and apply overrides
    ///
    /// Fails with `UnknownSchema` if the name does not resolve, or if an
    /// override names a field the schema does not have.
    pub fn create(self) -> RegistryResult<Value> {
        let mut value = self.generator.generate_named(&self.name)?;
        if self.overrides.is_empty() {
            return Ok(value);
        }
        let Value::Object(map) = &mut value else {
            return Err(RegistryError::UnknownSchema {
                name: format!("{}.{}", self.name, self.overrides[0].0),
            });
        };
        for (field, replacement) in self.overrides {
            match map.get_mut(&field) {
                Some(slot) => *slot = replacement,
                None => {
                    return Err(RegistryError::UnknownSchema {
                        name: format!("{}.{field}", self.name),
                    })
                }
            }
        }
        Ok(value)
    }
}
