//! Error handling for the context core.

use std::fmt;

/// A specialized [`Result`] type for context operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all the context core operations.
#[derive(Debug, Clone)]
pub struct Error {
    /// The raw code of the underlying native error.
    raw_code: Option<i64>,

    /// The raw message from the native api in case it could be obtained.
    raw_os_message: Option<String>,

    /// The simplified error kind to handle matching.
    kind: ErrorKind,
}

impl Error {
    /// Build an error from the native api diagnostics.
    ///
    /// Backends produce [`ErrorKind::Native`] errors, the driver translates
    /// them to the kind of the failing operation.
    pub fn new(raw_code: Option<i64>, raw_os_message: Option<String>, kind: ErrorKind) -> Self {
        Self { raw_code, raw_os_message, kind }
    }

    /// Shorthand for an unclassified native failure with a message.
    pub fn native(raw_code: Option<i64>, message: impl Into<String>) -> Self {
        Self::new(raw_code, Some(message.into()), ErrorKind::Native)
    }

    /// Reclassify the error, keeping the native code and message.
    ///
    /// Kinds that already carry meaning of their own, like
    /// [`ErrorKind::NotSupported`], keep their description as the message.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        if self.raw_os_message.is_none() && self.kind != ErrorKind::Native {
            self.raw_os_message = Some(self.kind.as_str().to_owned());
        }
        self.kind = kind;
        self
    }

    /// Helper to check that error is [`ErrorKind::NotSupported`].
    #[inline]
    pub fn not_supported(&self) -> bool {
        matches!(&self.kind, ErrorKind::NotSupported(_))
    }

    /// The underlying error kind.
    #[inline]
    pub fn error_kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying raw code in case it's present.
    #[inline]
    pub fn raw_code(&self) -> Option<i64> {
        self.raw_code
    }

    /// The native diagnostic message in case it's present.
    #[inline]
    pub fn raw_os_message(&self) -> Option<&str> {
        self.raw_os_message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw_code) = self.raw_code {
            write!(f, "[{raw_code:x}] ")?;
        }

        match self.raw_os_message.as_ref() {
            Some(raw_os_message) => write!(f, "{}: {raw_os_message}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

/// Build an error with just a kind.
impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { raw_code: None, raw_os_message: None, kind }
    }
}

/// A list specifying general categories of context core errors.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The native api rejected the requested context configuration.
    ContextCreation,

    /// Binding a context to the calling thread failed.
    ///
    /// For example when the context is current on another thread, or the
    /// context was lost after an interruption.
    MakeCurrent,

    /// Presenting the back buffer failed or nothing is current to present.
    Swap,

    /// The GL library could not be located or loaded.
    LoadLibrary,

    /// The argument does not name a live context.
    BadContext,

    /// An unrecognized attribute value was passed.
    BadAttribute,

    /// The operation is not supported by the platform.
    NotSupported(&'static str),

    /// Native failure not yet attributed to an operation.
    Native,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            ContextCreation => "context creation failed",
            MakeCurrent => "making the context current failed",
            Swap => "swapping the window failed",
            LoadLibrary => "loading the GL library failed",
            BadContext => "argument does not name a valid context",
            BadAttribute => "an unrecognized attribute or attribute value was passed",
            NotSupported(reason) => reason,
            Native => "native platform error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
