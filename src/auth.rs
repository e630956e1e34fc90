use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;

/// Path of the authentication service, relative to the endpoint.
pub(crate) const AUTH_PATH: &str = "auth";

/// Username and password kept for the lifetime of a session so an expired
/// token can be renewed without caller involvement.
#[derive(Clone, Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new<U: Into<String>, P: Into<SecretString>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// `{"auth": {"username": .., "password": ..}}`, the only place the password is serialized.
#[derive(Serialize)]
pub(crate) struct LoginBody<'body> {
    auth: AuthFields<'body>,
}

#[derive(Serialize)]
struct AuthFields<'body> {
    username: &'body str,
    password: &'body str,
}

impl<'body> LoginBody<'body> {
    pub(crate) fn new(credentials: &'body Credentials) -> Self {
        Self {
            auth: AuthFields {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            },
        }
    }
}

/// Session token carried by the first cookie of the login response.
pub(crate) fn session_cookie(response: &reqwest::Response) -> Option<SecretString> {
    response
        .cookies()
        .next()
        .map(|cookie| SecretString::from(cookie.value().to_owned()))
        .filter(|token| !token.expose_secret().is_empty())
}
