//! Zero-copy walk over encoded messages.
//!
//! This module provides **structure-only** traversal: it advances over tag/value
//! pairs without building [`Record`](crate::record::Record) trees. Use it when you need
//! to know whether a buffer decodes, or to pull out a single field, without paying
//! for a full decode.
//!
//! | Use case | Prefer |
//! |----------|--------|
//! | Check that bytes decode as a message | [`validate_message`] / [`Codec::validate`](crate::codec::Codec::validate) |
//! | Read one top-level field by number | [`find_field`] |
//! | Count top-level field occurrences | [`count_fields`] |
//! | Full decode for inspection | [codec](crate::codec) |
//!
//! [`validate_message`] applies the same rules the codec applies on decode (wire type
//! compatibility, packed runs, nesting limit), so a buffer it accepts deserializes
//! successfully.

use crate::codec::CodecError;
use crate::packed;
use crate::reader::{FieldReader, RawValue};
use crate::schema::{Cardinality, FieldDescriptor, MessageSchema, SchemaRegistry, ValueKind};
use crate::tag::WireType;

/// Read-only walker over one message body, checking it against a schema.
pub struct MessageWalker<'a> {
    registry: &'a SchemaRegistry,
    max_depth: usize,
}

impl<'a> MessageWalker<'a> {
    pub fn new(registry: &'a SchemaRegistry, max_depth: usize) -> Self {
        MessageWalker { registry, max_depth }
    }

    fn schema(&self, name: &str) -> Result<&'a MessageSchema, CodecError> {
        self.registry
            .get(name)
            .ok_or_else(|| CodecError::UnknownMessage(name.to_string()))
    }

    /// Walk every field of `bytes` as message `message_name`.
    pub fn validate(&self, message_name: &str, bytes: &[u8]) -> Result<(), CodecError> {
        let schema = self.schema(message_name)?;
        self.walk_fields(schema, bytes, 0)
    }

    fn walk_fields(&self, schema: &MessageSchema, bytes: &[u8], depth: usize) -> Result<(), CodecError> {
        let mut r = FieldReader::new(bytes);
        while r.has_remaining() {
            let field = r.read_field()?;
            if let Some(f) = schema.field_by_number(field.number) {
                self.walk_value(schema, f, field.value, depth)?;
            }
        }
        Ok(())
    }

    fn walk_value(
        &self,
        schema: &MessageSchema,
        f: &FieldDescriptor,
        raw: RawValue<'_>,
        depth: usize,
    ) -> Result<(), CodecError> {
        let actual = raw.wire_type();
        match (&f.kind, raw) {
            (ValueKind::Message(name), RawValue::LengthDelimited(payload)) => {
                if depth >= self.max_depth {
                    return Err(CodecError::NestingTooDeep { limit: self.max_depth });
                }
                let nested = self.schema(name)?;
                self.walk_fields(nested, payload, depth + 1)
            }
            (kind, RawValue::LengthDelimited(payload))
                if f.cardinality != Cardinality::OptionalScalar && packed::accepts_packed(kind) =>
            {
                skip_packed(payload, kind.wire_type())
            }
            (kind, _) if kind.wire_type() == actual => Ok(()),
            _ => Err(CodecError::SchemaMismatch {
                message: schema.name().to_string(),
                field: f.name.clone(),
                expected: f.wire_type(),
                actual,
            }),
        }
    }
}

fn skip_packed(payload: &[u8], wire_type: WireType) -> Result<(), CodecError> {
    let mut r = FieldReader::new(payload);
    while r.has_remaining() {
        r.skip_value(wire_type)?;
    }
    Ok(())
}

/// Check that `bytes` decodes as `message_name` without allocating decoded values.
pub fn validate_message(
    registry: &SchemaRegistry,
    message_name: &str,
    bytes: &[u8],
    max_depth: usize,
) -> Result<(), CodecError> {
    MessageWalker::new(registry, max_depth).validate(message_name, bytes)
}

/// Value of the last top-level occurrence of field `number`, borrowed from `bytes`.
///
/// Last occurrence matches last-tag-wins for singular fields. No schema is needed;
/// the whole buffer is still walked so malformed input is reported.
pub fn find_field(bytes: &[u8], number: u32) -> Result<Option<RawValue<'_>>, CodecError> {
    let mut r = FieldReader::new(bytes);
    let mut found = None;
    while r.has_remaining() {
        let field = r.read_field()?;
        if field.number == number {
            found = Some(field.value);
        }
    }
    Ok(found)
}

/// Number of top-level tag/value pairs in `bytes`.
pub fn count_fields(bytes: &[u8]) -> Result<usize, CodecError> {
    let mut r = FieldReader::new(bytes);
    let mut n = 0;
    while r.has_remaining() {
        let (_, wire_type) = r.read_tag()?;
        r.skip_value(wire_type)?;
        n += 1;
    }
    Ok(n)
}
