//! Error types shared by every layer of the codec.
//!
//! All fallible operations return [`Result<T>`](Result). Errors raised while
//! processing an object field are wrapped in [`Error::Field`] so the path to
//! the failing field is kept; [`Error::kind`] looks through those wrappers
//! and reports the category of the originating cause.

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The accessor a field descriptor is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Accessor {
    /// The field cannot be read, so it cannot be encoded.
    Getter,

    /// The field cannot be assigned, so it cannot be decoded.
    Setter,
}

impl std::fmt::Display for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Getter => f.write_str("getter"),
            Self::Setter => f.write_str("setter"),
        }
    }
}

/// Describes why an input region could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Malformed {
    /// The input ended before the requested number of bytes.
    #[error("{requested} byte(s) requested but only {available} remain")]
    UnexpectedEnd {
        /// Bytes the reader asked for.
        requested: usize,

        /// Bytes that were still unread.
        available: usize,
    },

    /// A string or array length prefix was negative.
    #[error("negative length prefix {0}")]
    NegativeLength(i32),

    /// A string payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// A boolean byte was neither `0` nor `1`.
    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    /// A presence flag byte was neither `0` nor `1`.
    #[error("invalid presence flag {0:#04x}")]
    InvalidPresenceFlag(u8),

    /// An enum discriminant does not name any variant.
    #[error("discriminant {value} does not name a variant of `{type_name}`")]
    InvalidDiscriminant {
        /// The enum being decoded.
        type_name: &'static str,

        /// The discriminant read from the input.
        value: i128,
    },

    /// A UTF-16 code unit is a lone surrogate.
    #[error("code unit {0:#06x} is not a valid character")]
    InvalidChar(u16),

    /// A read cursor was moved outside the written part of the region.
    #[error("read position {position} is past the written length {written}")]
    InvalidReadPosition {
        /// The requested read position.
        position: usize,

        /// The write cursor at the time of the request.
        written: usize,
    },
}

/// Coarse category of an [`Error`], independent of the field path it was
/// raised under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// See [`Error::BufferOverflow`].
    BufferOverflow,

    /// See [`Error::DepthExceeded`].
    DepthExceeded,

    /// See [`Error::UnsupportedType`].
    UnsupportedType,

    /// See [`Error::MissingAccessor`].
    MissingAccessor,

    /// See [`Error::MalformedInput`].
    MalformedInput,

    /// See [`Error::ValueOutOfRange`].
    ValueOutOfRange,
}

/// The error type of every encode, decode and compile operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A write would run past the end of the destination region.
    #[error(
        "buffer overflow: {requested} byte(s) requested at offset {offset} \
         with capacity {capacity}"
    )]
    BufferOverflow {
        /// The write cursor when the write was attempted.
        offset: usize,

        /// Bytes the writer asked for.
        requested: usize,

        /// Total capacity of the region.
        capacity: usize,
    },

    /// A nested object graph is deeper than the configured maximum.
    #[error("maximum depth of {max_depth} exceeded entering `{type_name}`")]
    DepthExceeded {
        /// The configured bound.
        max_depth: u16,

        /// The object type whose entry tripped the guard.
        type_name: &'static str,
    },

    /// The compiler cannot classify a type.
    #[error("`{type_name}` is not supported: {reason}")]
    UnsupportedType {
        /// The offending type.
        type_name: &'static str,

        /// Why the type cannot be encoded.
        reason: &'static str,
    },

    /// A field descriptor lacks an accessor the plan needs.
    #[error("field `{field}` of `{type_name}` has no {accessor}")]
    MissingAccessor {
        /// The object type declaring the field.
        type_name: &'static str,

        /// The field name.
        field: &'static str,

        /// The missing accessor.
        accessor: Accessor,
    },

    /// The input region is not a valid encoding of the requested type.
    #[error("malformed input at offset {offset}: {reason}")]
    MalformedInput {
        /// The read cursor when the problem was detected.
        offset: usize,

        /// What was wrong.
        reason: Malformed,
    },

    /// A value has no representation on the wire.
    #[error("{what} cannot be represented on the wire")]
    ValueOutOfRange {
        /// Description of the value.
        what: &'static str,
    },

    /// An error raised while processing a field of an object.
    #[error("in field `{field}` of `{type_name}`")]
    Field {
        /// The object type declaring the field.
        type_name: &'static str,

        /// The field name.
        field: &'static str,

        /// The originating error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps this error with the field it was raised under.
    #[must_use]
    pub fn in_field(
        self,
        type_name: &'static str,
        field: &'static str,
    ) -> Self {
        Self::Field { type_name, field, source: Box::new(self) }
    }

    /// Returns the innermost error, skipping [`Error::Field`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Field { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the dotted field path leading to the originating error, or
    /// an empty string for errors raised outside any object.
    #[must_use]
    pub fn field_path(&self) -> String {
        let mut path = Vec::new();
        let mut current = self;
        while let Self::Field { field, source, .. } = current {
            path.push(*field);
            current = source;
        }
        path.join(".")
    }

    /// Returns the category of the originating error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Self::BufferOverflow { .. } => ErrorKind::BufferOverflow,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::MissingAccessor { .. } => ErrorKind::MissingAccessor,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            Self::Field { .. } => unreachable!("root cause is never a wrapper"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_looks_through_field_wrappers() {
        let err = Error::DepthExceeded { max_depth: 16, type_name: "Node" }
            .in_field("Node", "next")
            .in_field("Node", "next");

        assert_eq!(err.kind(), ErrorKind::DepthExceeded);
        assert_eq!(err.field_path(), "next.next");
        assert!(matches!(err.root_cause(), Error::DepthExceeded { .. }));
    }

    #[test]
    fn display_keeps_originating_cause_as_source() {
        let err = Error::MalformedInput {
            offset: 3,
            reason: Malformed::NegativeLength(-1),
        }
        .in_field("Person", "name");

        assert_eq!(err.to_string(), "in field `name` of `Person`");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.to_string(),
            "malformed input at offset 3: negative length prefix -1"
        );
    }

    #[test]
    fn missing_accessor_display() {
        let err = Error::MissingAccessor {
            type_name: "Point",
            field: "x",
            accessor: Accessor::Setter,
        };

        assert_eq!(err.to_string(), "field `x` of `Point` has no setter");
        assert_eq!(err.kind(), ErrorKind::MissingAccessor);
        assert_eq!(err.field_path(), "");
    }
}
