//! Tri-state field wrapper for partial record updates.
//!
//! Every field of a published state record is either absent (not computed
//! this pass), present with a value, or explicitly cleared. A pass that
//! fails to resolve a value leaves the field `Unset`; downstream must then
//! keep whatever it already has rather than seeing a stale or zero value.

use serde::ser::{Serialize, Serializer};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence<T> {
    /// Field was not computed; must not overwrite downstream state.
    #[default]
    Unset,
    /// Field was computed to this value.
    Set(T),
    /// Field was computed to be empty; downstream should drop its value.
    Cleared,
}

impl<T> Presence<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Presence::Unset)
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Presence::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Presence::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Presence::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Presence<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Presence::Set(v),
            None => Presence::Unset,
        }
    }
}

// `Unset` fields are skipped at the struct level with
// `#[serde(skip_serializing_if = "Presence::is_unset")]`; `Cleared`
// serializes as an explicit null.
impl<T: Serialize> Serialize for Presence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Presence::Set(v) => serializer.serialize_some(v),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Presence<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let opt = Option::<T>::deserialize(deserializer)?;
        Ok(match opt {
            Some(v) => Presence::Set(v),
            None => Presence::Cleared,
        })
    }
}
