//! Resolved source-level types.
//!
//! Every HIR expression carries one of these. The selector maps them onto
//! the smaller CFG type lattice in [`crate::cfg::Type`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DefId;

/// A fully resolved source type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// The unit type (no meaningful value).
    Unit,
    /// The bottom type of diverging expressions.
    Nothing,
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
    /// Untyped native pointer.
    NativePtr,
    /// Reference to an instance of a class.
    Class(DefId),
    /// Array of the element type.
    Array(Box<Type>),
}

impl Type {
    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Unit)
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Type::Nothing)
    }

    /// Value types are passed and operated on directly rather than by reference.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            Type::Boolean
                | Type::Byte
                | Type::Short
                | Type::Int
                | Type::Long
                | Type::Float
                | Type::Double
                | Type::Char
                | Type::NativePtr
        )
    }

    /// Integer number types; excludes char and the floating-point types.
    pub fn is_primitive_integer(&self) -> bool {
        matches!(self, Type::Byte | Type::Short | Type::Int | Type::Long)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    /// The class this type refers to, if it is a class reference.
    pub fn as_class(&self) -> Option<DefId> {
        match self {
            Type::Class(def_id) => Some(*def_id),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "Unit"),
            Type::Nothing => write!(f, "Nothing"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Byte => write!(f, "Byte"),
            Type::Short => write!(f, "Short"),
            Type::Int => write!(f, "Int"),
            Type::Long => write!(f, "Long"),
            Type::Float => write!(f, "Float"),
            Type::Double => write!(f, "Double"),
            Type::Char => write!(f, "Char"),
            Type::String => write!(f, "String"),
            Type::NativePtr => write!(f, "NativePtr"),
            Type::Class(def_id) => write!(f, "Class({})", def_id),
            Type::Array(elem) => write!(f, "Array<{}>", elem),
        }
    }
}
