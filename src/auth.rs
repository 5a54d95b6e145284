use base64::Engine;

pub struct ApiToken(String);

impl From<&str> for ApiToken {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl ApiToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Jira Cloud account credentials (account email + API token).
#[derive(Debug)]
pub struct Credentials {
    email: String,
    token: ApiToken,
}

impl Credentials {
    pub fn new(email: &str, token: ApiToken) -> Self {
        Self {
            email: email.to_owned(),
            token,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Value for the `Authorization` header: `Basic base64(email:token)`.
    pub fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.email, self.token.as_str());
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        )
    }
}
