pub mod credentials;
pub mod signer;

#[derive(Debug)]
pub enum Error {
    EnvVarError {
        key: String,
        error: std::env::VarError,
    },
    IoError {
        message: String,
        error: std::io::Error,
    },
    ProfileNotFound {
        profile: String,
    },
    MissingProfileKey {
        profile: String,
        key: String,
    },
    MalformedCredentials {
        line: usize,
        content: String,
    },
    InvalidHeaderValue {
        name: String,
        error: reqwest::header::InvalidHeaderValue,
    },
}

impl Error {
    pub fn io_error<T>(message: &str, path: T, error: std::io::Error) -> Error
    where
        T: AsRef<std::path::Path>,
    {
        Error::IoError {
            message: format!("{} {}", message, path.as_ref().display()),
            error,
        }
    }

    pub fn env_var_error(key: &str, error: std::env::VarError) -> Error {
        Error::EnvVarError {
            key: key.to_owned(),
            error,
        }
    }

    pub fn missing_profile_key(profile: &str, key: &str) -> Error {
        Error::MissingProfileKey {
            profile: profile.to_owned(),
            key: key.to_owned(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::EnvVarError { key, error } => write!(f, "env var {}: {}", key, error),
            Error::IoError { message, error } => write!(f, "{}: {}", message, error),
            Error::ProfileNotFound { profile } => {
                write!(f, "profile [{}] not found in shared credentials", profile)
            }
            Error::MissingProfileKey { profile, key } => {
                write!(f, "profile [{}] has no {}", profile, key)
            }
            Error::MalformedCredentials { line, content } => {
                write!(f, "malformed credentials at line {}: {:?}", line, content)
            }
            Error::InvalidHeaderValue { name, error } => {
                write!(f, "invalid value for header {}: {}", name, error)
            }
        }
    }
}

impl std::error::Error for Error {}

type AuthResult<T> = std::result::Result<T, Error>;
