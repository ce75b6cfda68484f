// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur in the library.

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub(crate) fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (AmbiguousRecord, ambiguous_record),
    (DuplicateIdentifier, duplicate_identifier),
    (Internal, internal),
    (InvalidArgument, invalid_argument),
    (InvalidConfiguration, invalid_configuration),
    (InvalidGraph, invalid_graph),
    (MissingEntity, missing_entity),
    (NoPathBetweenNodes, no_path_between_nodes),
    (SchemaMismatch, schema_mismatch),
    (UnsupportedEntityKind, unsupported_entity_kind)
);

/// An error that can occur while building, querying or mutating a
/// [Grid][crate::Grid], its [ColumnStore][crate::ColumnStore]s or its graphs.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl Error {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human readable description of the error.
    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::missing_entity("Node 7 does not exist.");
        assert_eq!(err.kind(), ErrorKind::MissingEntity);
        assert_eq!(err.description(), "Node 7 does not exist.");
        assert_eq!(err.to_string(), "MissingEntity: Node 7 does not exist.");
        assert_ne!(err, Error::internal("Node 7 does not exist."));
    }
}
