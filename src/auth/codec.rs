//! Reversible password codec. The stored form is base64(nonce || ciphertext)
//! under AES-256-GCM with a key derived from the process-wide pass secret.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct PasswordCodec {
    cipher: Aes256Gcm,
}

impl PasswordCodec {
    pub fn new(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Encrypt a plaintext password for storage. A fresh nonce is drawn per
    /// call, so two encodings of the same password differ.
    pub fn encode(&self, plaintext: &str) -> anyhow::Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("password encrypt failed: {e}"))?;
        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(raw))
    }

    /// Recover the plaintext. Fails cleanly on a wrong secret or tampered
    /// input (the GCM tag check rejects it).
    pub fn decode(&self, stored: &str) -> anyhow::Result<String> {
        let raw = BASE64.decode(stored)?;
        if raw.len() < NONCE_LEN {
            anyhow::bail!("stored password too short");
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow::anyhow!("password decrypt failed"))?;
        Ok(String::from_utf8(plain)?)
    }

    /// Decode-and-equality check. Any decode failure is a mismatch.
    pub fn compare(&self, plaintext: &str, stored: &str) -> bool {
        self.decode(stored).map(|p| p == plaintext).unwrap_or(false)
    }
}
