//! Decoded/encodable message instances.
//!
//! A [`Record`] is keyed by field number and knows nothing about its schema; the
//! codec pairs it with a [`MessageSchema`](crate::schema::MessageSchema) on
//! serialize/deserialize. It owns its nested records and repeated sequences outright,
//! so cloning a record deep-copies the tree.

use crate::presence::PresenceTracker;
use crate::reader::{RawField, RawValue};
use crate::value::Value;
use std::collections::BTreeMap;

/// Storage for one field number.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Single(Value),
    Repeated(Vec<Value>),
}

/// Owned copy of a field value whose number the schema does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnknownValue {
    Varint(u64),
    Fixed64(u64),
    LengthDelimited(Vec<u8>),
    Fixed32(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField {
    pub number: u32,
    pub value: UnknownValue,
}

impl From<RawField<'_>> for UnknownField {
    fn from(field: RawField<'_>) -> Self {
        let value = match field.value {
            RawValue::Varint(v) => UnknownValue::Varint(v),
            RawValue::Fixed64(v) => UnknownValue::Fixed64(v),
            RawValue::LengthDelimited(b) => UnknownValue::LengthDelimited(b.to_vec()),
            RawValue::Fixed32(v) => UnknownValue::Fixed32(v),
        };
        UnknownField { number: field.number, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    slots: BTreeMap<u32, Slot>,
    presence: PresenceTracker,
    unknown: Vec<UnknownField>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a singular field and mark it present. Replaces any previous value.
    pub fn set(&mut self, field: u32, value: impl Into<Value>) {
        self.slots.insert(field, Slot::Single(value.into()));
        self.presence.mark_set(field);
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, field: u32, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Value of a singular field, if set.
    pub fn get(&self, field: u32) -> Option<&Value> {
        if !self.presence.is_set(field) {
            return None;
        }
        match self.slots.get(&field) {
            Some(Slot::Single(v)) => Some(v),
            _ => None,
        }
    }

    /// Singular fields: explicitly set. Repeated fields: non-empty.
    pub fn has(&self, field: u32) -> bool {
        match self.slots.get(&field) {
            Some(Slot::Repeated(values)) => !values.is_empty(),
            _ => self.presence.is_set(field),
        }
    }

    /// Mark a singular field set without storing a value; it then reads as unset through
    /// [`Record::get`] but encodes as its zero value when the field tracks presence.
    pub fn mark_set(&mut self, field: u32) {
        self.presence.mark_set(field);
    }

    /// Return a field to the unset state, dropping any stored value or sequence.
    pub fn clear(&mut self, field: u32) {
        self.slots.remove(&field);
        self.presence.clear(field);
    }

    /// Append to a repeated field. A singular value stored under the same number is replaced.
    pub fn push(&mut self, field: u32, value: impl Into<Value>) {
        self.repeated_mut(field).push(value.into());
    }

    /// Elements of a repeated field; empty when never pushed.
    pub fn repeated(&self, field: u32) -> &[Value] {
        match self.slots.get(&field) {
            Some(Slot::Repeated(values)) => values,
            _ => &[],
        }
    }

    pub fn repeated_mut(&mut self, field: u32) -> &mut Vec<Value> {
        let slot = self
            .slots
            .entry(field)
            .or_insert_with(|| Slot::Repeated(Vec::new()));
        if let Slot::Single(_) = slot {
            *slot = Slot::Repeated(Vec::new());
            self.presence.clear(field);
        }
        match slot {
            Slot::Repeated(values) => values,
            Slot::Single(_) => unreachable!("slot was just made repeated"),
        }
    }

    /// Nested record of a singular message field, if set.
    pub fn message(&self, field: u32) -> Option<&Record> {
        self.get(field).and_then(Value::as_message)
    }

    /// Nested record of a singular message field, created empty and marked set if absent.
    pub fn message_mut(&mut self, field: u32) -> &mut Record {
        self.presence.mark_set(field);
        let slot = self
            .slots
            .entry(field)
            .or_insert_with(|| Slot::Single(Value::Message(Record::new())));
        if !matches!(slot, Slot::Single(Value::Message(_))) {
            *slot = Slot::Single(Value::Message(Record::new()));
        }
        match slot {
            Slot::Single(Value::Message(record)) => record,
            _ => unreachable!("slot was just made a message"),
        }
    }

    /// Raw storage for a field number, whatever its shape.
    pub fn slot(&self, field: u32) -> Option<&Slot> {
        self.slots.get(&field)
    }

    /// Stored fields in ascending field-number order.
    pub fn slots(&self) -> impl Iterator<Item = (u32, &Slot)> {
        self.slots.iter().map(|(&n, s)| (n, s))
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Fields read from the wire that the schema did not know, in arrival order.
    pub fn unknown_fields(&self) -> &[UnknownField] {
        &self.unknown
    }

    pub fn push_unknown(&mut self, field: UnknownField) {
        self.unknown.push(field);
    }

    pub fn clear_unknown_fields(&mut self) {
        self.unknown.clear();
    }

    /// Number of field numbers with stored values.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.presence.is_empty() && self.unknown.is_empty()
    }

    /// Merge `other` into `self` with wire merge semantics: singular scalars in `other`
    /// overwrite, repeated fields append, nested messages merge recursively, and unknown
    /// fields append.
    pub fn merge(&mut self, other: Record) {
        let Record { slots, presence, unknown } = other;
        for (field, slot) in slots {
            match slot {
                Slot::Single(Value::Message(incoming)) if self.message(field).is_some() => {
                    self.message_mut(field).merge(incoming);
                }
                Slot::Single(value) => self.set(field, value),
                Slot::Repeated(values) => {
                    if !values.is_empty() {
                        self.repeated_mut(field).extend(values);
                    }
                }
            }
        }
        for field in presence.iter() {
            self.presence.mark_set(field);
        }
        self.unknown.extend(unknown);
    }
}
