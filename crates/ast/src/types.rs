// SPDX-FileCopyrightText: 2025 Graft Project Contributors
//
// SPDX-License-Identifier: Apache-2.0

//! # C/C++ Type Model
//!
//! Just enough of the C/C++ type system for mutation admissibility decisions:
//! builtin scalar classification, a handful of structural type shapes, and
//! const/volatile qualifiers.

use serde::{Deserialize, Serialize};

/// Builtin scalar types the mutation catalog understands.
///
/// `char` is treated as signed, matching the common default on the targets
/// the engine instruments for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    Bool,
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
}

impl BuiltinType {
    /// Integer classification, including `bool` (as in Clang's
    /// `BuiltinType::isInteger`).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !self.is_floating()
    }

    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self, Self::Bool)
    }

    #[must_use]
    pub const fn is_signed_integer(self) -> bool {
        matches!(
            self,
            Self::Char | Self::SChar | Self::Short | Self::Int | Self::Long | Self::LongLong
        )
    }

    #[must_use]
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::LongDouble)
    }

    /// The type's spelling in the target language. Spellings with spaces are
    /// flattened to underscores when used in dispatcher names.
    #[must_use]
    pub const fn name(self, is_cpp: bool) -> &'static str {
        match self {
            Self::Bool => {
                if is_cpp {
                    "bool"
                } else {
                    "_Bool"
                }
            }
            Self::Char => "char",
            Self::SChar => "signed char",
            Self::UChar => "unsigned char",
            Self::Short => "short",
            Self::UShort => "unsigned short",
            Self::Int => "int",
            Self::UInt => "unsigned int",
            Self::Long => "long",
            Self::ULong => "unsigned long",
            Self::LongLong => "long long",
            Self::ULongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
            Self::LongDouble => "long double",
        }
    }
}

/// Structural shape of a type, without qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Type {
    Builtin(BuiltinType),
    Pointer,
    Enum,
    Record,
    ConstantArray,
    VariableArray,
    DependentSizedArray,
    TemplateSpecialization,
    Decltype,
    Void,
    #[default]
    Other,
}

/// A type together with its cv-qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualType {
    pub ty: Type,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_volatile: bool,
}

impl QualType {
    #[must_use]
    pub const fn new(ty: Type) -> Self {
        Self {
            ty,
            is_const: false,
            is_volatile: false,
        }
    }

    #[must_use]
    pub const fn builtin(builtin: BuiltinType) -> Self {
        Self::new(Type::Builtin(builtin))
    }

    #[must_use]
    pub const fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    #[must_use]
    pub const fn with_volatile(mut self) -> Self {
        self.is_volatile = true;
        self
    }

    #[must_use]
    pub const fn as_builtin(&self) -> Option<BuiltinType> {
        match self.ty {
            Type::Builtin(builtin) => Some(builtin),
            _ => None,
        }
    }

    /// The catalog only rewrites operators over builtin integer, boolean and
    /// floating-point scalars.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.as_builtin().is_some()
    }

    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        matches!(self.ty, Type::Pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(BuiltinType::Bool.is_integer());
        assert!(!BuiltinType::Bool.is_signed_integer());
        assert!(BuiltinType::Int.is_signed_integer());
        assert!(!BuiltinType::UInt.is_signed_integer());
        assert!(BuiltinType::Double.is_floating());
        assert!(!BuiltinType::Double.is_integer());
    }

    #[test]
    fn names_per_language() {
        assert_eq!(BuiltinType::Bool.name(true), "bool");
        assert_eq!(BuiltinType::Bool.name(false), "_Bool");
        assert_eq!(BuiltinType::UInt.name(true), "unsigned int");
    }

    #[test]
    fn supported_types() {
        assert!(QualType::builtin(BuiltinType::Int).is_supported());
        assert!(!QualType::new(Type::Pointer).is_supported());
        assert!(!QualType::new(Type::Enum).is_supported());
    }
}
