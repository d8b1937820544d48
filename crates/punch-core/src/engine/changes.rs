//! Caller-facing partial updates and the tri-state patch cell.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::DeficiencyState;

/// One cell of a field-level diff.
///
/// `Keep` means the field is absent from the diff, `Clear` persists a
/// null, `Set` persists a value. Container structs pair this with
/// `#[serde(default, skip_serializing_if = "Apply::is_keep")]` so the
/// wire shape is: absent / null / value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Apply<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Apply<T> {
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// The value this cell sets, if any.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }

    /// The value a field holds after this cell is applied over `current`.
    #[must_use]
    pub fn effective<'a>(&'a self, current: Option<&'a T>) -> Option<&'a T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }

    /// Write this cell into a record slot. `Keep` is a no-op.
    pub fn write_to(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            Self::Keep => {}
            Self::Clear => *slot = None,
            Self::Set(value) => *slot = Some(value.clone()),
        }
    }
}

// Keep never reaches a serializer when paired with skip_serializing_if;
// it falls back to null if serialized standalone.
impl<T: Serialize> Serialize for Apply<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Keep | Self::Clear => serializer.serialize_none(),
            Self::Set(value) => serializer.serialize_some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Apply<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer)? {
            None => Self::Clear,
            Some(value) => Self::Set(value),
        })
    }
}

/// A caller-requested partial update.
///
/// Only present fields are considered; everything else is left alone.
/// There is deliberately no way to request a clear here — the engine is
/// the only author of cleared fields (go-back side effects).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeficiencyChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<DeficiencyState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan_to_fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_responsibility_group: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub current_due_date: Option<i64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub current_deferred_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_reason_incomplete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_complete_now_reason: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub current_start_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_duplicate: Option<bool>,
}

impl DeficiencyChanges {
    /// A change set that only requests a state transition.
    #[must_use]
    pub fn to_state(state: DeficiencyState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Apply, DeficiencyChanges};
    use crate::model::DeficiencyState;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Holder {
        #[serde(skip_serializing_if = "Apply::is_keep")]
        field: Apply<String>,
    }

    #[test]
    fn keep_is_absent_on_the_wire() {
        let json = serde_json::to_string(&Holder { field: Apply::Keep }).expect("serialize");
        assert_eq!(json, "{}");

        let back: Holder = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(back.field, Apply::Keep);
    }

    #[test]
    fn clear_is_null_on_the_wire() {
        let json = serde_json::to_string(&Holder {
            field: Apply::Clear,
        })
        .expect("serialize");
        assert_eq!(json, r#"{"field":null}"#);

        let back: Holder = serde_json::from_str(r#"{"field":null}"#).expect("deserialize");
        assert_eq!(back.field, Apply::Clear);
    }

    #[test]
    fn set_roundtrips_the_value() {
        let json = serde_json::to_string(&Holder {
            field: Apply::Set("patch".to_string()),
        })
        .expect("serialize");
        assert_eq!(json, r#"{"field":"patch"}"#);

        let back: Holder = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.field, Apply::Set("patch".to_string()));
    }

    #[test]
    fn effective_resolves_against_current() {
        let current = Some("old".to_string());
        assert_eq!(
            Apply::<String>::Keep.effective(current.as_ref()),
            current.as_ref()
        );
        assert_eq!(Apply::<String>::Clear.effective(current.as_ref()), None);
        assert_eq!(
            Apply::Set("new".to_string()).effective(current.as_ref()),
            Some(&"new".to_string())
        );
    }

    #[test]
    fn write_to_applies_each_variant() {
        let mut slot = Some("old".to_string());
        Apply::<String>::Keep.write_to(&mut slot);
        assert_eq!(slot.as_deref(), Some("old"));

        Apply::Set("new".to_string()).write_to(&mut slot);
        assert_eq!(slot.as_deref(), Some("new"));

        Apply::<String>::Clear.write_to(&mut slot);
        assert_eq!(slot, None);
    }

    #[test]
    fn changes_only_consider_present_fields() {
        let changes: DeficiencyChanges =
            serde_json::from_str(r#"{"state": "pending", "current_due_date": 1578441600}"#)
                .expect("deserialize");
        assert_eq!(changes.state, Some(DeficiencyState::Pending));
        assert_eq!(changes.current_due_date, Some(1_578_441_600));
        assert!(changes.current_plan_to_fix.is_none());
        assert!(changes.is_duplicate.is_none());
    }
}
