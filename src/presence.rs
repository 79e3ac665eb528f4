//! Field presence: which singular fields were explicitly set, and whether they are emitted.
//!
//! Every singular field is in one of two states, `Unset` or `Set(value)`. The
//! [`PresenceTracker`] keeps the set/unset half of that state independently of the
//! stored value, so a field explicitly set to its zero value is distinguishable from
//! one never touched. Whether that distinction reaches the wire depends on the
//! field's [`Presence`]:
//!
//! | Presence | Set, non-zero | Set, zero | Unset |
//! |----------|---------------|-----------|-------|
//! | `Implicit` | emitted | omitted | omitted |
//! | `Tracked` (and every message field) | emitted | emitted | omitted |

use crate::schema::FieldDescriptor;
use crate::value::Value;
use std::collections::BTreeSet;

/// How a singular scalar field's "set" state is observed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    /// Set-ness is inferred from the value: zero values are never written.
    #[default]
    Implicit,
    /// Set-ness is recorded and written even for zero values.
    Tracked,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceTracker {
    set: BTreeSet<u32>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self, field: u32) -> bool {
        self.set.contains(&field)
    }

    pub fn mark_set(&mut self, field: u32) {
        self.set.insert(field);
    }

    pub fn clear(&mut self, field: u32) {
        self.set.remove(&field);
    }

    /// Field numbers currently set, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.set.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

/// Decide whether a singular field is written on encode.
///
/// `value` is the stored value, if any; a field marked set without a stored value
/// counts as set to its zero value.
pub fn should_emit(field: &FieldDescriptor, value: Option<&Value>, is_set: bool) -> bool {
    if !is_set {
        return false;
    }
    if field.has_tracked_presence() {
        return true;
    }
    value.is_some_and(|v| !v.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueKind;

    #[test]
    fn tracker_set_and_clear() {
        let mut p = PresenceTracker::new();
        assert!(!p.is_set(3));
        p.mark_set(3);
        p.mark_set(1);
        assert!(p.is_set(3));
        assert_eq!(p.iter().collect::<Vec<_>>(), vec![1, 3]);
        p.clear(3);
        assert!(!p.is_set(3));
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn implicit_zero_is_omitted() {
        let f = FieldDescriptor::scalar("enabled", 2, ValueKind::Bool);
        assert!(!should_emit(&f, Some(&Value::Bool(false)), true));
        assert!(should_emit(&f, Some(&Value::Bool(true)), true));
        assert!(!should_emit(&f, Some(&Value::Bool(true)), false));
        assert!(!should_emit(&f, None, true));
    }

    #[test]
    fn tracked_zero_is_emitted() {
        let f = FieldDescriptor::optional("size", 1, ValueKind::Int32);
        assert!(should_emit(&f, Some(&Value::I32(0)), true));
        assert!(should_emit(&f, None, true));
        assert!(!should_emit(&f, Some(&Value::I32(5)), false));
    }

    #[test]
    fn message_fields_always_track() {
        let f = FieldDescriptor::message("child", 4, "Child");
        assert!(should_emit(&f, Some(&Value::Message(Default::default())), true));
    }
}
