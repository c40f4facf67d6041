//! Error types for flattening and un-flattening.

use thiserror::Error;

/// Errors raised while converting between typed values and flat strings.
///
/// Flattening a value never fails: every [`Flat`](crate::Flat) type carries a
/// default encoding. Every failure here comes from the reverse direction,
/// where untrusted strings meet declared types.
#[derive(Debug, Error)]
pub enum FlatError {
    /// A field declared by the version type is absent from the flat mapping.
    #[error("missing field '{field}' for {type_name}")]
    MissingField {
        /// The version type being reconstructed.
        type_name: &'static str,
        /// The absent field.
        field: String,
    },

    /// The flat mapping carries a key the version type does not declare.
    #[error("unexpected field '{field}' for {type_name}")]
    UnexpectedField {
        /// The version type being reconstructed.
        type_name: &'static str,
        /// The unrecognised key.
        field: String,
    },

    /// The default decoder could not parse the string.
    #[error("cannot parse {value:?} as {type_name}: {reason}")]
    Parse {
        /// The destination type.
        type_name: &'static str,
        /// The offending flat value.
        value: String,
        /// The underlying parser message.
        reason: String,
    },

    /// A registered decoder rejected the string.
    #[error("invalid value {value:?} for {type_name}")]
    InvalidValue {
        /// The destination type.
        type_name: &'static str,
        /// The offending flat value.
        value: String,
    },

    /// No enum member carries the given name.
    #[error("{type_name} has no member named {name:?}")]
    UnknownMember {
        /// The destination enum.
        type_name: &'static str,
        /// The unknown member name.
        name: String,
    },

    /// A registered decoder produced a value of the wrong type.
    #[error("codec registered for {registered} produced a value that is not {expected}")]
    TypeMismatch {
        /// The key the decoder was found under.
        registered: &'static str,
        /// The type the caller asked for.
        expected: &'static str,
    },

    /// A nested JSON payload could not be decoded.
    #[error("invalid nested JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FlatError {
    /// Creates a [`Parse`](Self::Parse) error for `T`.
    pub fn parse<T: ?Sized>(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            type_name: core::any::type_name::<T>(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an [`InvalidValue`](Self::InvalidValue) error for `T`.
    pub fn invalid_value<T: ?Sized>(value: impl Into<String>) -> Self {
        Self::InvalidValue {
            type_name: core::any::type_name::<T>(),
            value: value.into(),
        }
    }

    /// Creates a [`MissingField`](Self::MissingField) error for `T`.
    pub fn missing_field<T: ?Sized>(field: impl Into<String>) -> Self {
        Self::MissingField {
            type_name: core::any::type_name::<T>(),
            field: field.into(),
        }
    }

    /// Creates an [`UnexpectedField`](Self::UnexpectedField) error for `T`.
    pub fn unexpected_field<T: ?Sized>(field: impl Into<String>) -> Self {
        Self::UnexpectedField {
            type_name: core::any::type_name::<T>(),
            field: field.into(),
        }
    }
}
