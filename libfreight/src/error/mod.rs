//! Error types for freight
//!
//! Every fallible operation in the library returns [`FreightError`]. The
//! variants keep "the resolution is broken" programmatically apart from
//! "nothing new to promote": absence is never an error, it is an
//! `Ok(None)` or an empty version string.

use thiserror::Error;

#[cfg(test)]
mod tests;

/// Main error type for freight operations
#[derive(Error, Debug)]
pub enum FreightError {
    /// Configuration errors (invalid strategy, regex, platform, missing constraint,
    /// unreadable config file). Always raised before any network call.
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network-related errors (connection, TLS, timeout, cancellation)
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Non-2xx responses other than authentication failures
    #[error("received unexpected HTTP {status_code} from {url}")]
    HttpStatus { url: String, status_code: u16 },

    /// Authentication errors (401, 403, token exchange)
    #[error("Authentication error (status: {status_code:?}): {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
    },

    /// Malformed documents, versions or constraint expressions
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The chart is absent from an otherwise valid repository index
    #[error("no versions of chart \"{chart}\" found in repository index from \"{repository}\"")]
    ChartNotFound { chart: String, repository: String },

    /// A registry operation failed; wraps the underlying cause
    #[error("Registry error while {operation} for {repository}")]
    Registry {
        operation: String,
        repository: String,
        #[source]
        source: Box<FreightError>,
    },
}

/// Result type alias for freight operations
pub type Result<T> = std::result::Result<T, FreightError>;

/// Coarse classification of a [`FreightError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Transport,
    HttpStatus,
    Authentication,
    Parse,
    NotFound,
    Registry,
}

impl FreightError {
    /// Creates a new configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::error::FreightError;
    ///
    /// let err = FreightError::config("invalid image selection strategy \"nope\"");
    /// assert!(matches!(err, FreightError::Config { .. }));
    /// ```
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: None,
            source: Some(Box::new(source)),
        }
    }

    /// Creates a configuration error tied to a config file.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::error::FreightError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    /// let err = FreightError::config_file("failed to read config", Some("/etc/freight.yaml"), io_err);
    /// assert!(matches!(err, FreightError::Config { path: Some(_), .. }));
    /// ```
    pub fn config_file<S, P, E>(message: S, path: Option<P>, source: E) -> Self
    where
        S: Into<String>,
        P: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new network error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::error::FreightError;
    ///
    /// let err = FreightError::network("connection refused");
    /// assert!(matches!(err, FreightError::Network { .. }));
    /// ```
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new network error with a source error.
    pub fn network_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new unexpected-status error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::error::FreightError;
    ///
    /// let err = FreightError::http_status("https://charts.example.com/index.yaml", 404);
    /// assert!(err.to_string().contains("unexpected HTTP 404"));
    /// ```
    pub fn http_status<S: Into<String>>(url: S, status_code: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status_code,
        }
    }

    /// Creates a new authentication error.
    pub fn authentication<S: Into<String>>(message: S, status_code: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status_code,
        }
    }

    /// Creates a new parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new parse error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::error::FreightError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::InvalidData, "invalid data");
    /// let err = FreightError::parse_with_source("error parsing version \"x\"", io_err);
    /// assert!(matches!(err, FreightError::Parse { .. }));
    /// ```
    pub fn parse_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new chart-not-found error.
    pub fn chart_not_found<C, R>(chart: C, repository: R) -> Self
    where
        C: Into<String>,
        R: Into<String>,
    {
        Self::ChartNotFound {
            chart: chart.into(),
            repository: repository.into(),
        }
    }

    /// Wraps `source` as a failed registry operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use libfreight::error::FreightError;
    ///
    /// let err = FreightError::registry(
    ///     "listing tags",
    ///     "ghcr.io/example/app",
    ///     FreightError::network("connection refused"),
    /// );
    /// assert!(err.is_transport());
    /// ```
    pub fn registry<O, R>(operation: O, repository: R, source: FreightError) -> Self
    where
        O: Into<String>,
        R: Into<String>,
    {
        Self::Registry {
            operation: operation.into(),
            repository: repository.into(),
            source: Box::new(source),
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Network { .. } => ErrorKind::Transport,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::ChartNotFound { .. } => ErrorKind::NotFound,
            Self::Registry { .. } => ErrorKind::Registry,
        }
    }

    /// Returns the innermost error, looking through `Registry` wrappers.
    pub fn root(&self) -> &FreightError {
        match self {
            Self::Registry { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the failure happened below HTTP (DNS, TLS, connect,
    /// timeout, cancellation), including when wrapped by a registry error.
    pub fn is_transport(&self) -> bool {
        self.root().kind() == ErrorKind::Transport
    }
}
