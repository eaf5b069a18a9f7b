use std::{error::Error, fmt::Display};

/// This type gets used to be our catch all error.
/// The first four variants are the failures of the segment tree operations themselves,
/// the remaining ones wrap everything the drivers run into.
#[derive(Debug)]
pub enum StreeError {
    /// An input value can not be represented exactly in the element type of a tree.
    ConversionError(String),
    /// A checked sum left the range of the element type.
    OverflowError(String),
    /// An update was addressed to a position outside of `0..len`.
    IndexOutOfRange {
        /// The requested position.
        index: isize,
        /// The number of leaves of the tree.
        len: usize,
    },
    /// An unknown aggregator name or an otherwise unusable argument.
    InvalidArgument(String),
    /// Allows a generic Error message.
    StringError(String),
    /// Anticipated errors, may be rethrown with an additional error message
    RethrowError(String, Box<dyn Error>),
    /// All other library Errors get converted to this error.
    OtherError(Box<dyn Error>),
}

/// This type is our goto Result, as it allows us to convert between many different errors.
pub type StreeResult<O> = Result<O, StreeError>;

impl Display for StreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreeError::ConversionError(str) => write!(f, "conversion error: {}", str),
            StreeError::OverflowError(str) => write!(f, "overflow error: {}", str),
            StreeError::IndexOutOfRange { index, len } => write!(
                f,
                "segment tree index out of range: {} is not in 0..{}",
                index, len
            ),
            StreeError::InvalidArgument(str) => write!(f, "invalid argument: {}", str),
            StreeError::StringError(str) => str.fmt(f),
            StreeError::RethrowError(str, err) => {
                str.fmt(f)?;
                " with: ".fmt(f)?;
                err.fmt(f)?;
                Ok(())
            }
            StreeError::OtherError(err) => err.fmt(f),
        }
    }
}
impl Error for StreeError {}

impl StreeError {
    /// Allows to annotate a StreeError with a context to better detect the origin of errors.
    /// # Usage
    /// ```
    /// # use common::{StreeError, StreeResult};
    /// # fn fallible_function() -> StreeResult<()> {
    /// # Err(StreeError::StringError("".into()))
    /// # }
    /// # fn container_function() -> StreeResult<()> {
    /// fallible_function().map_err(StreeError::rethrow_with("function failed"))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn rethrow_with(str: &'static str) -> impl Fn(StreeError) -> StreeError {
        move |err| StreeError::RethrowError(str.to_string(), Box::new(err))
    }

    /// Whether this error (or the error it rethrows) is an [StreeError::OverflowError].
    pub fn is_overflow(&self) -> bool {
        match self {
            StreeError::OverflowError(_) => true,
            StreeError::RethrowError(_, inner) => inner
                .downcast_ref::<StreeError>()
                .map_or(false, StreeError::is_overflow),
            _ => false,
        }
    }
}

macro_rules! implement_from {
    ($type:ty) => {
        impl From<$type> for StreeError {
            fn from(other: $type) -> Self {
                StreeError::OtherError(Box::from(other))
            }
        }
    };
}
implement_from!(std::io::Error);
implement_from!(serde_json::Error);
implement_from!(std::num::ParseIntError);
implement_from!(serde_dhall::Error);

impl<'a> From<&'a str> for StreeError {
    fn from(other: &'a str) -> Self {
        StreeError::StringError(other.to_string())
    }
}
impl From<String> for StreeError {
    fn from(other: String) -> Self {
        StreeError::StringError(other)
    }
}
