//! Admin session gate.
//!
//! A successful login issues `admin-auth=v1.<issued_at>.<hmac>`, where the
//! HMAC-SHA256 over `v1:<issued_at>` is keyed by the session secret. Any
//! request carrying an unexpired token with a valid MAC is authenticated.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, warn};

use crate::core::config::AuthConfig;

pub const ADMIN_COOKIE: &str = "admin-auth";
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 24;
const CLOCK_SKEW_SECS: u64 = 60;
const TOKEN_VERSION: &str = "v1";

pub struct AuthGate<'a> {
    config: &'a AuthConfig,
}

impl<'a> AuthGate<'a> {
    #[must_use]
    pub fn new(config: &'a AuthConfig) -> Self {
        Self { config }
    }

    /// Returns the `Set-Cookie` value for a new session if the trimmed
    /// password is on the allow-list.
    #[must_use]
    pub fn login(&self, password: &str) -> Option<String> {
        let candidate = password.trim();
        if !self.config.passwords.iter().any(|p| p == candidate) {
            warn!("Admin login rejected");
            return None;
        }
        let token = issue_token(&self.config.session_secret, now_secs());
        Some(session_cookie(&token, self.config.secure_cookies))
    }

    /// Checks the `admin-auth` cookie value, if any.
    #[must_use]
    pub fn check(&self, cookie_value: Option<&str>) -> bool {
        self.check_at(cookie_value, now_secs())
    }

    #[must_use]
    pub fn check_at(&self, cookie_value: Option<&str>, now: u64) -> bool {
        cookie_value.is_some_and(|token| verify_token(&self.config.session_secret, token, now))
    }

    /// `Set-Cookie` value that expires the session immediately.
    #[must_use]
    pub fn logout(&self) -> String {
        cleared_cookie(self.config.secure_cookies)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn mac_for(secret: &str, issued_at: u64) -> Option<Hmac<Sha256>> {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return None;
        }
    };
    mac.update(format!("{TOKEN_VERSION}:{issued_at}").as_bytes());
    Some(mac)
}

#[must_use]
pub fn issue_token(secret: &str, issued_at: u64) -> String {
    let signature = mac_for(secret, issued_at)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("{TOKEN_VERSION}.{issued_at}.{signature}")
}

/// Verifies the MAC in constant time and the token age against `now`.
#[must_use]
pub fn verify_token(secret: &str, token: &str, now: u64) -> bool {
    let mut parts = token.splitn(3, '.');
    let (Some(version), Some(issued), Some(signature)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if version != TOKEN_VERSION {
        return false;
    }
    let Ok(issued_at) = issued.parse::<u64>() else {
        return false;
    };
    if issued_at > now + CLOCK_SKEW_SECS || now.saturating_sub(issued_at) > SESSION_TTL_SECS {
        return false;
    }
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };
    mac_for(secret, issued_at).is_some_and(|mac| mac.verify_slice(&signature).is_ok())
}

#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{ADMIN_COOKIE}={token}; Path=/; Max-Age={SESSION_TTL_SECS}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[must_use]
pub fn cleared_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{ADMIN_COOKIE}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
