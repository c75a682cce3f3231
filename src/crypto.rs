//! LINE signs every webhook delivery with HMAC-SHA256 over the raw request
//! body, keyed by the channel secret, and sends the base64 digest in
//! `x-line-signature`.

use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-line-signature";

fn mac(secret: &[u8], body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("hmac takes keys of any size");
    mac.update(body);
    mac
}

#[cfg(test)]
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    general_purpose::STANDARD.encode(mac(secret, body).finalize().into_bytes())
}

pub fn is_valid(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let digest = match general_purpose::STANDARD.decode(signature.trim()) {
        Ok(v) => v,
        Err(_) => return false,
    };
    mac(secret, body).verify_slice(&digest).is_ok()
}
