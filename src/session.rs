//! Signed session cookie tying a browser to its active conversation.
//!
//! Cookie value is `<chat_id>.<base64url hmac-sha256(chat_id)>`, keyed with
//! the configured session secret, so a forged cookie cannot attach to
//! another visitor's conversation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "chat";

pub fn sign_chat_id(secret: &str, chat_id: &str) -> String {
    format!("{chat_id}.{}", signature(secret, chat_id))
}

pub fn verify_cookie(secret: &str, value: &str) -> Option<String> {
    let (chat_id, sig) = value.rsplit_once('.')?;
    let decoded = URL_SAFE_NO_PAD.decode(sig).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(chat_id.as_bytes());
    mac.verify_slice(&decoded).ok()?;
    Some(chat_id.to_string())
}

/// Extract and verify the active chat id from a raw `Cookie` header.
pub fn chat_id_from_cookies(secret: &str, cookie_header: Option<&str>) -> Option<String> {
    let header = cookie_header?;
    for part in header.split(';') {
        if let Some(value) = part.trim().strip_prefix(SESSION_COOKIE) {
            if let Some(value) = value.strip_prefix('=') {
                return verify_cookie(secret, value);
            }
        }
    }
    None
}

fn signature(secret: &str, chat_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(chat_id.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_cookie_round_trips() {
        let signed = sign_chat_id("secret", "abc-123");
        assert_eq!(verify_cookie("secret", &signed).as_deref(), Some("abc-123"));
    }

    #[test]
    fn tampered_or_foreign_cookies_are_rejected() {
        let signed = sign_chat_id("secret", "abc-123");
        let forged = signed.replacen("abc", "xyz", 1);
        assert_eq!(verify_cookie("secret", &forged), None);
        assert_eq!(verify_cookie("other-secret", &signed), None);
        assert_eq!(verify_cookie("secret", "no-signature"), None);
        assert_eq!(verify_cookie("secret", "id.!!not-base64!!"), None);
    }

    #[test]
    fn chat_cookie_is_found_among_others() {
        let signed = sign_chat_id("secret", "abc-123");
        let header = format!("theme=dark; chat={signed}; lang=en");
        assert_eq!(
            chat_id_from_cookies("secret", Some(&header)).as_deref(),
            Some("abc-123")
        );
        assert_eq!(chat_id_from_cookies("secret", None), None);
        assert_eq!(chat_id_from_cookies("secret", Some("theme=dark")), None);
    }
}
