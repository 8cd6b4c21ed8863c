//! Live login validation.
//!
//! A candidate profile is accepted only if the remote endpoint accepts its
//! credentials. The secret presented to the endpoint is always the password
//! followed by the security token.

use anyhow::Context;
use reqwest::blocking::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::profiles::ConnectionProfile;

/// Login rejected or endpoint unreachable.
///
/// Both cases carry a message meant for the user and are handled the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
}

impl AuthError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The fields presented to the endpoint for one login attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub security_token: String,
}

impl Credentials {
    /// Password and security token concatenated, as the endpoint expects
    pub fn secret(&self) -> String {
        format!("{}{}", self.password, self.security_token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl From<&ConnectionProfile> for Credentials {
    fn from(profile: &ConnectionProfile) -> Self {
        Self {
            login_url: profile.login_url.clone(),
            username: profile.username.clone(),
            password: profile.password.clone(),
            security_token: profile.security_token.clone(),
        }
    }
}

pub trait EndpointValidator {
    fn validate(&self, credentials: &Credentials) -> Result<(), AuthError>;
}

/// Validates credentials with a SOAP `login` call.
#[derive(Debug, Clone)]
pub struct SoapLoginValidator {
    client: Client,
    api_version: String,
}

impl SoapLoginValidator {
    pub fn new(timeout: Duration, api_version: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sfconn/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_version: api_version.into(),
        })
    }

    /// SOAP endpoint for a login URL, e.g.
    /// `https://login.salesforce.com/services/Soap/u/42.0`
    pub fn endpoint(&self, login_url: &str) -> String {
        format!(
            "{}/services/Soap/u/{}",
            login_url.trim_end_matches('/'),
            self.api_version
        )
    }
}

impl EndpointValidator for SoapLoginValidator {
    fn validate(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let endpoint = self.endpoint(&credentials.login_url);
        debug!(%endpoint, username = %credentials.username, "attempting login");

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "login")
            .body(login_envelope(&credentials.username, &credentials.secret()))
            .send()
            .map_err(|e| AuthError::new(format!("Could not reach {}: {}", endpoint, e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| AuthError::new(format!("Failed to read login response: {}", e)))?;
        debug!(%status, "login response received");

        if status.is_success() && extract_element(&body, "sessionId").is_some() {
            return Ok(());
        }

        match extract_element(&body, "faultstring") {
            Some(fault) => Err(AuthError::new(xml_unescape(&fault))),
            None => Err(AuthError::new(format!(
                "Login failed with HTTP status {}",
                status
            ))),
        }
    }
}

fn login_envelope(username: &str, secret: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema""#,
            r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#,
            r#" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<env:Body><n1:login xmlns:n1="urn:partner.soap.sforce.com">"#,
            "<n1:username>{}</n1:username>",
            "<n1:password>{}</n1:password>",
            "</n1:login></env:Body></env:Envelope>"
        ),
        xml_escape(username),
        xml_escape(secret)
    )
}

/// Text content of the first `<name>` element, ignoring any namespace prefix.
fn extract_element(xml: &str, name: &str) -> Option<String> {
    let mut rest = xml;
    while let Some(start) = rest.find('<') {
        rest = &rest[start + 1..];
        let end = rest.find('>')?;
        let tag = &rest[..end];
        rest = &rest[end + 1..];

        if tag.starts_with('/') || tag.starts_with('?') || tag.ends_with('/') {
            continue;
        }
        let tag_name = tag.split_whitespace().next().unwrap_or_default();
        let local = tag_name.rsplit(':').next().unwrap_or(tag_name);
        if local != name {
            continue;
        }

        let close = rest.find(&format!("</{}>", tag_name))?;
        return Some(rest[..close].to_string());
    }
    None
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn xml_unescape(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
