//! # protowire — Protocol buffers binary wire codec
//!
//! A schema-driven encoder/decoder for the protocol buffers binary encoding. Records
//! are described by [`MessageSchema`]s (ordered field descriptors with number, kind
//! and cardinality) and converted to and from the tag-stream wire format byte-exactly.
//!
//! ## Wire format
//!
//! Every field occurrence is `tag (varint) || value`, with the tag
//! `(field_number << 3) | wire_type`:
//!
//! | Wire type | Value |
//! |-----------|-------|
//! | 0 varint | base-128 varint; `int32`/`int64` zig-zag, `bool` 0/1 |
//! | 1 fixed64 | 8 bytes little-endian |
//! | 2 length-delimited | varint length then payload (string, bytes, nested message, packed run) |
//! | 5 fixed32 | 4 bytes little-endian |
//!
//! A top-level message has no framing of its own; it is the concatenation of its fields.
//!
//! ## Presence
//!
//! Singular scalars default to implicit presence: a zero value is never written, even
//! when explicitly set. Fields declared with [`FieldDescriptor::optional`] and all
//! message fields track presence and are written whenever set. See [`presence`].
//!
//! ## Compatibility
//!
//! Unknown fields are skipped by wire type and, by default, kept on the record and
//! re-emitted on encode. Repeated numeric fields accept packed and unpacked input
//! regardless of how they are declared.
//!
//! ## Usage
//!
//! ```
//! use protowire::{Codec, FieldDescriptor, MessageSchema, Record, SchemaRegistry, Value, ValueKind};
//!
//! let registry = SchemaRegistry::resolve(vec![MessageSchema::new("Flag")
//!     .field(FieldDescriptor::scalar("name", 1, ValueKind::String))
//!     .field(FieldDescriptor::scalar("enabled", 2, ValueKind::Bool))])
//! .expect("valid schema");
//! let codec = Codec::with_defaults(registry);
//!
//! let record = Record::new().with(1, "x").with(2, false);
//! let bytes = codec.serialize("Flag", &record).expect("encode");
//! assert_eq!(bytes, [0x0a, 0x01, 0x78]);
//!
//! let decoded = codec.deserialize("Flag", &bytes).expect("decode");
//! assert_eq!(decoded.get(1).and_then(Value::as_str), Some("x"));
//! assert!(!decoded.has(2));
//! ```

pub mod codec;
pub mod packed;
pub mod presence;
pub mod reader;
pub mod record;
pub mod schema;
pub mod tag;
pub mod value;
pub mod varint;
pub mod walk;
pub mod writer;

pub use codec::{
    get_decode_profile, reset_decode_profile, Codec, CodecError, CodecOptions, PartialDecode,
    DEFAULT_MAX_DEPTH,
};
pub use packed::RepeatedEncoding;
pub use presence::{Presence, PresenceTracker};
pub use reader::{FieldReader, RawField, RawValue};
pub use record::{Record, Slot, UnknownField, UnknownValue};
pub use schema::{Cardinality, FieldDescriptor, MessageSchema, SchemaError, SchemaRegistry, ValueKind};
pub use tag::{decode_tag, encode_tag, WireType, MAX_FIELD_NUMBER};
pub use value::Value;
pub use varint::{decode_varint, encode_varint, zigzag_decode, zigzag_encode};
pub use walk::{count_fields, find_field, validate_message, MessageWalker};
pub use writer::FieldWriter;
