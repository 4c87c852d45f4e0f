//! Errors that carry only a message and the place they were raised.

macro_rules! located_error {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
        #[display("{}: {} at line {} in {}", $label, message, line, file)]
        pub struct $name {
            /// What went wrong
            pub message: String,
            /// Line number where the error occurred
            pub line: u32,
            /// File where the error occurred
            pub file: &'static str,
        }

        impl $name {
            /// Create the error at the caller's location.
            #[track_caller]
            pub fn new(message: impl Into<String>) -> Self {
                let location = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: location.line(),
                    file: location.file(),
                }
            }
        }
    };
}

located_error!(
    /// Run settings that cannot be used: a bad config file, flag or period.
    ///
    /// ```
    /// use gamebook_error::ConfigError;
    ///
    /// let err = ConfigError::new("timeout must be at least the sleep interval");
    /// assert!(err.to_string().starts_with("Configuration Error: timeout"));
    /// ```
    ConfigError,
    "Configuration Error"
);

located_error!(
    /// Failure fetching a remote story document.
    HttpError,
    "HTTP Error"
);

located_error!(
    /// Failure reading or writing a JSON checkpoint.
    JsonError,
    "JSON Error"
);
