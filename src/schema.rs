//! Message schemas: field descriptors and the registry the codec resolves message names against.

use crate::packed::RepeatedEncoding;
use crate::presence::Presence;
use crate::tag::{is_valid_field_number, WireType};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// What a field holds, which also fixes its wire type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Zig-zag varint.
    Int32,
    /// Zig-zag varint.
    Int64,
    UInt32,
    UInt64,
    Bool,
    /// Plain varint of the sign-extended `i32`.
    Enum,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Float,
    Double,
    String,
    Bytes,
    /// Nested message, by schema name in the same [`SchemaRegistry`].
    Message(String),
}

impl ValueKind {
    pub fn wire_type(&self) -> WireType {
        match self {
            ValueKind::Int32
            | ValueKind::Int64
            | ValueKind::UInt32
            | ValueKind::UInt64
            | ValueKind::Bool
            | ValueKind::Enum => WireType::Varint,
            ValueKind::Fixed32 | ValueKind::SFixed32 | ValueKind::Float => WireType::Fixed32,
            ValueKind::Fixed64 | ValueKind::SFixed64 | ValueKind::Double => WireType::Fixed64,
            ValueKind::String | ValueKind::Bytes | ValueKind::Message(_) => WireType::LengthDelimited,
        }
    }

    /// Numeric, bool and enum kinds; only these may use packed encoding.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    pub fn is_message(&self) -> bool {
        matches!(self, ValueKind::Message(_))
    }

    pub fn message_name(&self) -> Option<&str> {
        match self {
            ValueKind::Message(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int32 => f.write_str("int32"),
            ValueKind::Int64 => f.write_str("int64"),
            ValueKind::UInt32 => f.write_str("uint32"),
            ValueKind::UInt64 => f.write_str("uint64"),
            ValueKind::Bool => f.write_str("bool"),
            ValueKind::Enum => f.write_str("enum"),
            ValueKind::Fixed32 => f.write_str("fixed32"),
            ValueKind::Fixed64 => f.write_str("fixed64"),
            ValueKind::SFixed32 => f.write_str("sfixed32"),
            ValueKind::SFixed64 => f.write_str("sfixed64"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::Double => f.write_str("double"),
            ValueKind::String => f.write_str("string"),
            ValueKind::Bytes => f.write_str("bytes"),
            ValueKind::Message(name) => write!(f, "message {}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    OptionalScalar,
    RepeatedPacked,
    RepeatedUnpacked,
    RepeatedMessage,
    OptionalMessage,
}

impl Cardinality {
    pub fn is_repeated(self) -> bool {
        matches!(
            self,
            Cardinality::RepeatedPacked | Cardinality::RepeatedUnpacked | Cardinality::RepeatedMessage
        )
    }

    /// Encode-time representation of a repeated field; `None` for singular fields.
    pub fn repeated_encoding(self) -> Option<RepeatedEncoding> {
        match self {
            Cardinality::RepeatedPacked => Some(RepeatedEncoding::Packed),
            Cardinality::RepeatedUnpacked | Cardinality::RepeatedMessage => Some(RepeatedEncoding::Unpacked),
            Cardinality::OptionalScalar | Cardinality::OptionalMessage => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    pub kind: ValueKind,
    pub cardinality: Cardinality,
    pub presence: Presence,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        number: u32,
        kind: ValueKind,
        cardinality: Cardinality,
        presence: Presence,
    ) -> Self {
        FieldDescriptor {
            name: name.into(),
            number,
            kind,
            cardinality,
            presence,
        }
    }

    /// Singular scalar with implicit presence (omitted on encode when zero).
    pub fn scalar(name: impl Into<String>, number: u32, kind: ValueKind) -> Self {
        Self::new(name, number, kind, Cardinality::OptionalScalar, Presence::Implicit)
    }

    /// Singular scalar with tracked presence (emitted whenever set).
    pub fn optional(name: impl Into<String>, number: u32, kind: ValueKind) -> Self {
        Self::new(name, number, kind, Cardinality::OptionalScalar, Presence::Tracked)
    }

    pub fn packed(name: impl Into<String>, number: u32, kind: ValueKind) -> Self {
        Self::new(name, number, kind, Cardinality::RepeatedPacked, Presence::Implicit)
    }

    pub fn unpacked(name: impl Into<String>, number: u32, kind: ValueKind) -> Self {
        Self::new(name, number, kind, Cardinality::RepeatedUnpacked, Presence::Implicit)
    }

    pub fn message(name: impl Into<String>, number: u32, type_name: impl Into<String>) -> Self {
        Self::new(
            name,
            number,
            ValueKind::Message(type_name.into()),
            Cardinality::OptionalMessage,
            Presence::Tracked,
        )
    }

    pub fn repeated_message(name: impl Into<String>, number: u32, type_name: impl Into<String>) -> Self {
        Self::new(
            name,
            number,
            ValueKind::Message(type_name.into()),
            Cardinality::RepeatedMessage,
            Presence::Implicit,
        )
    }

    /// Declared wire type of one element of this field.
    pub fn wire_type(&self) -> WireType {
        self.kind.wire_type()
    }

    pub fn is_repeated(&self) -> bool {
        self.cardinality.is_repeated()
    }

    /// Message-typed fields always track presence; scalars only when declared optional.
    pub fn has_tracked_presence(&self) -> bool {
        self.kind.is_message() || self.presence == Presence::Tracked
    }
}

/// Ordered field list for one record type. Declaration order is the encode order.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_number: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl MessageSchema {
    pub fn new(name: impl Into<String>) -> Self {
        MessageSchema {
            name: name.into(),
            fields: Vec::new(),
            by_number: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Append a field. Duplicates are reported by [`SchemaRegistry::resolve`].
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        let idx = self.fields.len();
        self.by_number.entry(field.number).or_insert(idx);
        self.by_name.entry(field.name.clone()).or_insert(idx);
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&i| &self.fields[i])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    fn check(&self, registry_names: &HashMap<String, usize>) -> Result<(), SchemaError> {
        let mut numbers = HashSet::new();
        let mut names = HashSet::new();
        for f in &self.fields {
            if !is_valid_field_number(f.number) {
                return Err(SchemaError::FieldNumberOutOfRange {
                    message: self.name.clone(),
                    field: f.name.clone(),
                    number: f.number,
                });
            }
            if !numbers.insert(f.number) {
                return Err(SchemaError::DuplicateFieldNumber {
                    message: self.name.clone(),
                    number: f.number,
                });
            }
            if !names.insert(f.name.as_str()) {
                return Err(SchemaError::DuplicateFieldName {
                    message: self.name.clone(),
                    field: f.name.clone(),
                });
            }
            let invalid = |reason: &'static str| SchemaError::InvalidCardinality {
                message: self.name.clone(),
                field: f.name.clone(),
                reason,
            };
            match f.cardinality {
                Cardinality::OptionalMessage | Cardinality::RepeatedMessage if !f.kind.is_message() => {
                    return Err(invalid("message cardinality on a non-message kind"));
                }
                Cardinality::OptionalScalar | Cardinality::RepeatedUnpacked if f.kind.is_message() => {
                    return Err(invalid("message kind needs a message cardinality"));
                }
                Cardinality::RepeatedPacked if !f.kind.is_packable() => {
                    return Err(invalid("only numeric, bool and enum fields can be packed"));
                }
                _ => {}
            }
            if f.is_repeated() && f.presence == Presence::Tracked {
                return Err(invalid("repeated fields cannot track presence"));
            }
            if let Some(type_name) = f.kind.message_name() {
                if !registry_names.contains_key(type_name) {
                    return Err(SchemaError::UnknownMessageType {
                        message: self.name.clone(),
                        field: f.name.clone(),
                        type_name: type_name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate message name: {0}")]
    DuplicateMessage(String),
    #[error("Duplicate field number {number} in {message}")]
    DuplicateFieldNumber { message: String, number: u32 },
    #[error("Duplicate field name {field} in {message}")]
    DuplicateFieldName { message: String, field: String },
    #[error("Field {message}.{field}: number {number} outside 1..=536870911")]
    FieldNumberOutOfRange { message: String, field: String, number: u32 },
    #[error("Field {message}.{field}: {reason}")]
    InvalidCardinality { message: String, field: String, reason: &'static str },
    #[error("Field {message}.{field}: unknown message type {type_name}")]
    UnknownMessageType { message: String, field: String, type_name: String },
}

/// All message schemas of a protocol, validated and indexed by name.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    messages: Vec<MessageSchema>,
    by_name: HashMap<String, usize>,
}

impl SchemaRegistry {
    pub fn resolve(messages: Vec<MessageSchema>) -> Result<Self, SchemaError> {
        let mut by_name = HashMap::new();
        for (i, m) in messages.iter().enumerate() {
            if by_name.insert(m.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateMessage(m.name.clone()));
            }
        }
        for m in &messages {
            m.check(&by_name)?;
        }
        Ok(SchemaRegistry { messages, by_name })
    }

    pub fn get(&self, name: &str) -> Option<&MessageSchema> {
        self.by_name.get(name).map(|&i| &self.messages[i])
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageSchema> {
        self.messages.iter()
    }
}
