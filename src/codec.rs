//! Encode/decode records against message schemas.
//!
//! Encoding walks the schema in declaration order and writes `tag || value` for every
//! field that should be present on the wire. Decoding reads tags until the input is
//! exhausted and dispatches on the field number: known fields are decoded by kind and
//! cardinality, unknown ones are skipped by wire type (and optionally retained).
//!
//! Decode semantics that matter for compatibility:
//!
//! - Singular scalars: last occurrence wins.
//! - Repeated numeric fields: packed runs and unpacked elements are both accepted,
//!   whatever the schema declares.
//! - Singular messages: repeated occurrences merge field by field.
//! - Strings: bytes are kept verbatim, never validated.

use crate::packed::{self, RepeatedEncoding};
use crate::presence::should_emit;
use crate::reader::{FieldReader, RawValue};
use crate::record::{Record, Slot, UnknownField, UnknownValue};
use crate::schema::{Cardinality, FieldDescriptor, MessageSchema, SchemaRegistry, ValueKind};
use crate::tag::{is_valid_field_number, WireType};
use crate::value::Value;
use crate::walk;
use crate::writer::FieldWriter;
use tracing::{debug, trace};
use std::collections::HashMap;

/// Nesting limit applied when no other is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Deepest nested message accepted on decode (the top-level message is depth 0).
    pub max_depth: usize,
    /// Keep unknown fields on decoded records and re-emit them on encode.
    pub preserve_unknown: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            preserve_unknown: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed varint: longer than 10 bytes or overflows 64 bits")]
    MalformedVarint,
    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },
    #[error("Invalid wire type: {0}")]
    InvalidWireType(u8),
    #[error("Schema mismatch: {message}.{field} is {expected}, read as {actual}")]
    SchemaMismatch {
        message: String,
        field: String,
        expected: WireType,
        actual: WireType,
    },
    #[error("Nesting too deep: more than {limit} levels")]
    NestingTooDeep { limit: usize },
    #[error("Unknown message: {0}")]
    UnknownMessage(String),
    #[error("Value mismatch: {message}.{field} holds a value that is not {kind}")]
    ValueMismatch { message: String, field: String, kind: String },
}

/// A failed decode together with what had been decoded before the failure.
///
/// The partial record is for diagnostics only; it is never a successful result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error} (partial record holds {} fields)", .partial.len())]
pub struct PartialDecode {
    pub error: CodecError,
    pub partial: Record,
}

#[derive(Debug)]
pub struct Codec {
    options: CodecOptions,
    registry: SchemaRegistry,
}

impl Codec {
    pub fn new(registry: SchemaRegistry, options: CodecOptions) -> Self {
        debug!(
            messages = registry.messages().count(),
            max_depth = options.max_depth,
            preserve_unknown = options.preserve_unknown,
            "codec ready"
        );
        Codec { options, registry }
    }

    pub fn with_defaults(registry: SchemaRegistry) -> Self {
        Self::new(registry, CodecOptions::default())
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    fn schema(&self, name: &str) -> Result<&MessageSchema, CodecError> {
        self.registry
            .get(name)
            .ok_or_else(|| CodecError::UnknownMessage(name.to_string()))
    }

    /// Encode a record as message `message_name`. The record is not modified.
    pub fn serialize(&self, message_name: &str, record: &Record) -> Result<Vec<u8>, CodecError> {
        let schema = self.schema(message_name)?;
        let mut w = FieldWriter::new();
        self.encode_fields(&mut w, schema, record)?;
        Ok(w.into_inner())
    }

    /// Decode a complete message. Nothing is returned on failure.
    pub fn deserialize(&self, message_name: &str, bytes: &[u8]) -> Result<Record, CodecError> {
        self.deserialize_with_partial(message_name, bytes)
            .map_err(|p| p.error)
    }

    /// Decode a complete message; on failure the error carries the partially built record.
    pub fn deserialize_with_partial(
        &self,
        message_name: &str,
        bytes: &[u8],
    ) -> Result<Record, PartialDecode> {
        let schema = self.schema(message_name).map_err(|error| PartialDecode {
            error,
            partial: Record::new(),
        })?;
        let mut record = Record::new();
        match self.decode_fields(bytes, schema, &mut record, 0) {
            Ok(()) => Ok(record),
            Err(error) => {
                debug!(message = message_name, %error, len = bytes.len(), "decode failed");
                Err(PartialDecode { error, partial: record })
            }
        }
    }

    /// Decode `bytes` and merge the result into `target`. On failure `target` is untouched.
    pub fn merge_from_bytes(
        &self,
        message_name: &str,
        bytes: &[u8],
        target: &mut Record,
    ) -> Result<(), CodecError> {
        let decoded = self.deserialize(message_name, bytes)?;
        target.merge(decoded);
        Ok(())
    }

    /// Check that `bytes` decodes as `message_name` without building a record.
    pub fn validate(&self, message_name: &str, bytes: &[u8]) -> Result<(), CodecError> {
        walk::validate_message(&self.registry, message_name, bytes, self.options.max_depth)
    }

    fn encode_fields(
        &self,
        w: &mut FieldWriter,
        schema: &MessageSchema,
        record: &Record,
    ) -> Result<(), CodecError> {
        for f in schema.fields() {
            let slot = record.slot(f.number);
            let Some(encoding) = f.cardinality.repeated_encoding() else {
                if let Some(Slot::Repeated(_)) = slot {
                    return Err(value_mismatch(schema, f));
                }
                let value = record.get(f.number);
                if !should_emit(f, value, record.presence().is_set(f.number)) {
                    continue;
                }
                match value {
                    Some(v) => self.encode_tagged(w, schema, f, v)?,
                    None => self.encode_tagged(w, schema, f, &Value::zero_for(&f.kind))?,
                }
                continue;
            };
            let values: &[Value] = match slot {
                Some(Slot::Single(_)) => return Err(value_mismatch(schema, f)),
                Some(Slot::Repeated(values)) => values,
                None => &[],
            };
            match encoding {
                RepeatedEncoding::Packed => {
                    if values.is_empty() {
                        continue;
                    }
                    let mut run = FieldWriter::new();
                    if !packed::write_packed(&mut run, &f.kind, values) {
                        return Err(value_mismatch(schema, f));
                    }
                    w.write_tag(f.number, WireType::LengthDelimited);
                    w.write_length_delimited(run.as_slice());
                }
                RepeatedEncoding::Unpacked => {
                    for v in values {
                        self.encode_tagged(w, schema, f, v)?;
                    }
                }
            }
        }
        if self.options.preserve_unknown {
            for u in record.unknown_fields() {
                encode_unknown(w, u);
            }
        }
        Ok(())
    }

    fn encode_tagged(
        &self,
        w: &mut FieldWriter,
        schema: &MessageSchema,
        f: &FieldDescriptor,
        value: &Value,
    ) -> Result<(), CodecError> {
        if !value.fits(&f.kind) {
            return Err(value_mismatch(schema, f));
        }
        w.write_tag(f.number, f.wire_type());
        match (&f.kind, value) {
            (ValueKind::Message(name), Value::Message(nested)) => {
                let nested_schema = self.schema(name)?;
                let mut scratch = FieldWriter::new();
                self.encode_fields(&mut scratch, nested_schema, nested)?;
                w.write_length_delimited(scratch.as_slice());
            }
            _ => {
                value.write_plain(&f.kind, w);
            }
        }
        Ok(())
    }

    fn decode_fields(
        &self,
        bytes: &[u8],
        schema: &MessageSchema,
        record: &mut Record,
        depth: usize,
    ) -> Result<(), CodecError> {
        let mut r = FieldReader::new(bytes);
        while r.has_remaining() {
            let field = r.read_field()?;
            let Some(f) = schema.field_by_number(field.number) else {
                trace!(
                    message = schema.name(),
                    number = field.number,
                    wire_type = %field.value.wire_type(),
                    "skipping unknown field"
                );
                if self.options.preserve_unknown && is_valid_field_number(field.number) {
                    record.push_unknown(UnknownField::from(field));
                }
                continue;
            };
            #[cfg(feature = "decode_profile")]
            let _timer = profile::Timer::start(&f.kind);
            self.decode_field(schema, f, field.value, record, depth)?;
        }
        Ok(())
    }

    fn decode_field(
        &self,
        schema: &MessageSchema,
        f: &FieldDescriptor,
        raw: RawValue<'_>,
        record: &mut Record,
        depth: usize,
    ) -> Result<(), CodecError> {
        if let ValueKind::Message(name) = &f.kind {
            let RawValue::LengthDelimited(payload) = raw else {
                return Err(schema_mismatch(schema, f, raw.wire_type()));
            };
            if depth >= self.options.max_depth {
                return Err(CodecError::NestingTooDeep { limit: self.options.max_depth });
            }
            let nested_schema = self.schema(name)?;
            if f.cardinality == Cardinality::RepeatedMessage {
                let mut child = Record::new();
                let result = self.decode_fields(payload, nested_schema, &mut child, depth + 1);
                record.push(f.number, Value::Message(child));
                return result;
            }
            // A repeated occurrence decodes straight into the existing record, which
            // gives field-level merge.
            let child = record.message_mut(f.number);
            return self.decode_fields(payload, nested_schema, child, depth + 1);
        }

        if f.cardinality == Cardinality::OptionalScalar {
            let value = Value::from_raw(&f.kind, raw)
                .ok_or_else(|| schema_mismatch(schema, f, raw.wire_type()))?;
            record.set(f.number, value);
            return Ok(());
        }

        match raw {
            RawValue::LengthDelimited(payload) if packed::accepts_packed(&f.kind) => {
                if f.cardinality == Cardinality::RepeatedUnpacked {
                    trace!(message = schema.name(), field = %f.name, "packed run for unpacked field");
                }
                let mut run = Vec::new();
                packed::read_packed(payload, &f.kind, &mut run)?;
                // An empty run leaves the field absent.
                if !run.is_empty() {
                    record.repeated_mut(f.number).extend(run);
                }
                Ok(())
            }
            other => {
                if f.cardinality == Cardinality::RepeatedPacked {
                    trace!(message = schema.name(), field = %f.name, "unpacked element for packed field");
                }
                let value = Value::from_raw(&f.kind, other)
                    .ok_or_else(|| schema_mismatch(schema, f, other.wire_type()))?;
                record.push(f.number, value);
                Ok(())
            }
        }
    }
}

fn schema_mismatch(schema: &MessageSchema, f: &FieldDescriptor, actual: WireType) -> CodecError {
    CodecError::SchemaMismatch {
        message: schema.name().to_string(),
        field: f.name.clone(),
        expected: f.wire_type(),
        actual,
    }
}

fn value_mismatch(schema: &MessageSchema, f: &FieldDescriptor) -> CodecError {
    CodecError::ValueMismatch {
        message: schema.name().to_string(),
        field: f.name.clone(),
        kind: f.kind.to_string(),
    }
}

fn encode_unknown(w: &mut FieldWriter, u: &UnknownField) {
    match &u.value {
        UnknownValue::Varint(v) => {
            w.write_tag(u.number, WireType::Varint);
            w.write_varint(*v);
        }
        UnknownValue::Fixed64(v) => {
            w.write_tag(u.number, WireType::Fixed64);
            w.write_fixed64(*v);
        }
        UnknownValue::LengthDelimited(b) => {
            w.write_tag(u.number, WireType::LengthDelimited);
            w.write_length_delimited(b);
        }
        UnknownValue::Fixed32(v) => {
            w.write_tag(u.number, WireType::Fixed32);
            w.write_fixed32(*v);
        }
    }
}

/// Per-thread decode time, bucketed by the wire form of each known field.
#[cfg(feature = "decode_profile")]
mod profile {
    use super::{ValueKind, WireType};
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::time::Instant;

    const BUCKETS: [&str; 5] = ["varint", "fixed64", "length-delimited", "fixed32", "message"];

    // (hits, nanoseconds) per bucket
    thread_local!(static STATS: [Cell<(u64, u64)>; 5] = Default::default());

    fn bucket(kind: &ValueKind) -> usize {
        match kind {
            ValueKind::Message(_) => 4,
            other => match other.wire_type() {
                WireType::Varint => 0,
                WireType::Fixed64 => 1,
                WireType::LengthDelimited => 2,
                WireType::Fixed32 => 3,
            },
        }
    }

    /// Adds its lifetime to the field's bucket on drop. Nested message time
    /// includes the nested fields.
    pub(super) struct Timer {
        bucket: usize,
        start: Instant,
    }

    impl Timer {
        pub(super) fn start(kind: &ValueKind) -> Self {
            Timer { bucket: bucket(kind), start: Instant::now() }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let ns = self.start.elapsed().as_nanos() as u64;
            STATS.with(|st| {
                let cell = &st[self.bucket];
                let (hits, total) = cell.get();
                cell.set((hits + 1, total.saturating_add(ns)));
            });
        }
    }

    pub(super) fn reset() {
        STATS.with(|st| st.iter().for_each(|c| c.set((0, 0))));
    }

    pub(super) fn snapshot() -> HashMap<String, u64> {
        STATS.with(|st| {
            BUCKETS
                .iter()
                .zip(st.iter())
                .filter(|(_, c)| c.get().0 > 0)
                .map(|(label, c)| (label.to_string(), c.get().1))
                .collect()
        })
    }
}

/// Zero this thread's decode timings. Does nothing without the `decode_profile` feature.
pub fn reset_decode_profile() {
    #[cfg(feature = "decode_profile")]
    profile::reset();
}

/// Nanoseconds this thread spent decoding, keyed by "varint", "fixed32", "fixed64",
/// "length-delimited" or "message". Empty without the `decode_profile` feature.
pub fn get_decode_profile() -> HashMap<String, u64> {
    #[cfg(feature = "decode_profile")]
    let stats = profile::snapshot();
    #[cfg(not(feature = "decode_profile"))]
    let stats = HashMap::new();
    stats
}
