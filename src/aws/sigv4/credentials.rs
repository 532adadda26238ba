use std::{fmt::Debug, path::Path};

use super::{AuthResult, Error};

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_owned(),
            secret_access_key: secret_access_key.to_owned(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, session_token: &str) -> Self {
        self.session_token = Some(session_token.to_owned());
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(super) fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional `AWS_SESSION_TOKEN`.
    pub fn from_env() -> AuthResult<Self> {
        fn var(key: &str) -> AuthResult<String> {
            std::env::var(key).map_err(|err| Error::env_var_error(key, err))
        }

        let credentials = Self::new(&var("AWS_ACCESS_KEY_ID")?, &var("AWS_SECRET_ACCESS_KEY")?);
        Ok(match std::env::var("AWS_SESSION_TOKEN") {
            Ok(token) if !token.is_empty() => credentials.with_session_token(&token),
            _ => credentials,
        })
    }

    pub fn from_profile_str(content: &str, profile: &str) -> AuthResult<Self> {
        let properties = profile_properties(content, profile)?;
        let get = |key: &str| {
            properties
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        let access_key_id =
            get(ACCESS_KEY_ID).ok_or_else(|| Error::missing_profile_key(profile, ACCESS_KEY_ID))?;
        let secret_access_key = get(SECRET_ACCESS_KEY)
            .ok_or_else(|| Error::missing_profile_key(profile, SECRET_ACCESS_KEY))?;

        let credentials = Self::new(access_key_id, secret_access_key);
        Ok(match get(SESSION_TOKEN) {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }

    pub async fn from_file<T>(file_path: T, profile: &str) -> AuthResult<Self>
    where
        T: AsRef<Path>,
    {
        let content = tokio::fs::read_to_string(file_path.as_ref())
            .await
            .map_err(|err| Error::io_error("error while reading file", file_path.as_ref(), err))?;
        Self::from_profile_str(&content, profile)
    }
}

/// Key/value pairs of one `[profile]` section of an ini style shared credentials file.
/// Sections named `[profile name]` (config file flavour) are accepted as well.
fn profile_properties(content: &str, profile: &str) -> AuthResult<Vec<(String, String)>> {
    let mut found = false;
    let mut in_profile = false;
    let mut properties = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let section = section.trim();
            let name = section.strip_prefix("profile ").unwrap_or(section).trim();
            in_profile = name == profile;
            found |= in_profile;
            continue;
        }

        if !in_profile {
            continue;
        }

        match line.split_once('=') {
            Some((key, value)) => {
                properties.push((key.trim().to_lowercase(), value.trim().to_owned()))
            }
            None => {
                return Err(Error::MalformedCredentials {
                    line: index + 1,
                    content: raw.to_owned(),
                })
            }
        }
    }

    if found {
        Ok(properties)
    } else {
        Err(Error::ProfileNotFound {
            profile: profile.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::aws::sigv4::{credentials::Credentials, Error};

    const SHARED: &str = r#"
# generated by aws configure
[default]
aws_access_key_id = AKIDDEFAULT
aws_secret_access_key = default-secret

[demo]
aws_access_key_id=AKIDDEMO
aws_secret_access_key=demo/secret+key
aws_session_token = token==
; trailing comment

[profile other]
aws_access_key_id = AKIDOTHER
"#;

    #[test]
    fn test_default_profile() {
        let actual = Credentials::from_profile_str(SHARED, "default").unwrap();
        assert_eq!(Credentials::new("AKIDDEFAULT", "default-secret"), actual);
    }

    #[test]
    fn test_named_profile_with_session_token() {
        let actual = Credentials::from_profile_str(SHARED, "demo").unwrap();
        assert_eq!(
            Credentials::new("AKIDDEMO", "demo/secret+key").with_session_token("token=="),
            actual
        );
    }

    #[test]
    fn test_profile_not_found() {
        let err = Credentials::from_profile_str(SHARED, "missing").unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound { profile } if profile == "missing"));
    }

    #[test]
    fn test_profile_missing_secret() {
        let err = Credentials::from_profile_str(SHARED, "other").unwrap_err();
        assert!(
            matches!(err, Error::MissingProfileKey { ref key, .. } if key == "aws_secret_access_key"),
            "unexpected error {:?}",
            err
        );
    }

    #[test]
    fn test_malformed_line() {
        let err = Credentials::from_profile_str("[default]\nnot a pair\n", "default").unwrap_err();
        assert!(matches!(err, Error::MalformedCredentials { line: 2, .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let c = Credentials::new("AKID", "very-secret").with_session_token("very-token");
        let debug = format!("{:?}", c);
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("very-token"));
    }
}
