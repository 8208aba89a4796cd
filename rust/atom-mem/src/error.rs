use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    #[cold]
    pub fn allocation_failure(capacity: usize, source: Option<std::io::Error>) -> Error {
        ErrorKind::AllocationFailure { capacity, source }.into()
    }

    #[cold]
    pub fn out_of_memory(requested: usize, alignment: usize, remaining: usize) -> Error {
        ErrorKind::OutOfMemory {
            requested,
            alignment,
            remaining,
        }
        .into()
    }

    #[cold]
    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn is_allocation_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::AllocationFailure { .. })
    }

    pub fn is_out_of_memory(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfMemory { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The backing buffer could not be obtained; no arena was created.
    #[error("failed to obtain a {capacity} byte backing buffer")]
    AllocationFailure {
        capacity: usize,
        source: Option<std::io::Error>,
    },

    /// The request does not fit in the remaining capacity. The arena is unchanged.
    #[error(
        "arena out of memory: requested {requested} bytes aligned to {alignment}, \
         {remaining} bytes remaining"
    )]
    OutOfMemory {
        requested: usize,
        alignment: usize,
        remaining: usize,
    },

    /// A precondition on an argument was violated. The arena is unchanged.
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::out_of_memory(50, 1, 44);
        assert_eq!(
            e.to_string(),
            "arena out of memory: requested 50 bytes aligned to 1, 44 bytes remaining"
        );
        assert!(e.is_out_of_memory());

        let e = Error::invalid_arg("alignment", "alignment.is_power_of_two()");
        assert_eq!(
            e.to_string(),
            "invalid argument alignment: alignment.is_power_of_two()"
        );
        assert!(e.is_invalid_argument());
    }

    #[test]
    fn test_allocation_failure_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no pages");
        let e = Error::allocation_failure(4096, Some(io));
        assert!(e.is_allocation_failure());
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "failed to obtain a 4096 byte backing buffer");

        let e = Error::allocation_failure(1, None);
        assert!(e.source().is_none());
    }

    #[test]
    fn test_into_kind() {
        match Error::out_of_memory(7, 8, 0).into_kind() {
            ErrorKind::OutOfMemory {
                requested,
                alignment,
                remaining,
            } => assert_eq!((requested, alignment, remaining), (7, 8, 0)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
