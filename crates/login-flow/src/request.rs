use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub account: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(account: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Proxy as submitted by the caller: a scheme and `[user:pass@]host[:port]`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProxyDescriptor {
    pub protocol: String,
    pub data: String,
}

impl ProxyDescriptor {
    /// `None` when either half is blank, which callers use to mean "no proxy".
    pub fn new(protocol: impl Into<String>, data: impl Into<String>) -> Option<Self> {
        let protocol = protocol.into();
        let data = data.into();
        if protocol.trim().is_empty() || data.trim().is_empty() {
            return None;
        }
        Some(Self { protocol, data })
    }
}

/// Secondary authentication material accepted alongside the credentials.
///
/// None of the current flow branches consume it; it travels with the request so a
/// driver or future branch can.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SecondaryAuth {
    pub recovery: Option<String>,
    pub totp_secret: Option<String>,
    pub apple_data: Option<String>,
}

impl SecondaryAuth {
    pub fn is_empty(&self) -> bool {
        self.recovery.is_none() && self.totp_secret.is_none() && self.apple_data.is_none()
    }
}

impl fmt::Debug for SecondaryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryAuth")
            .field("recovery", &self.recovery.is_some())
            .field("totp_secret", &self.totp_secret.is_some())
            .field("apple_data", &self.apple_data.is_some())
            .finish()
    }
}

/// Everything one login run needs. Lives only as long as the run that consumes it.
#[derive(Clone, Debug)]
pub struct LoginRequest {
    pub credentials: Credentials,
    pub url: String,
    pub proxy: Option<ProxyDescriptor>,
    /// Raw tab-separated cookie records.
    pub cookies: Vec<String>,
    pub mobile: bool,
    pub secondary: SecondaryAuth,
}

impl LoginRequest {
    pub fn new(credentials: Credentials, url: impl Into<String>) -> Self {
        Self {
            credentials,
            url: url.into(),
            proxy: None,
            cookies: Vec::new(),
            mobile: false,
            secondary: SecondaryAuth::default(),
        }
    }

    pub fn account(&self) -> &str {
        &self.credentials.account
    }
}
