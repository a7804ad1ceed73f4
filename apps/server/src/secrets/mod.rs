//! Encryption of bank provider access tokens at rest.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use kgiq_core::{bank::TokenCipher, errors::Error, Result};

const NONCE_LEN: usize = 12;

/// ChaCha20-Poly1305 with a random nonce per value. Ciphertexts are stored
/// as base64 of `nonce || ciphertext`.
pub struct ChaChaTokenCipher {
    key: [u8; 32],
}

impl ChaChaTokenCipher {
    pub fn new(key: &[u8]) -> Result<Self> {
        let key: [u8; 32] = key
            .try_into()
            .map_err(|_| Error::Secret("Token encryption key must be 32 bytes".into()))?;
        Ok(Self { key })
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.key))
    }
}

impl TokenCipher for ChaChaTokenCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| Error::Secret("Failed to encrypt access token".into()))?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    fn decrypt(&self, sealed: &str) -> Result<String> {
        let bytes = BASE64
            .decode(sealed.trim())
            .map_err(|e| Error::Secret(format!("Failed to decode access token: {e}")))?;
        if bytes.len() <= NONCE_LEN {
            return Err(Error::Secret("Encrypted access token is truncated".into()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Secret("Failed to decrypt access token".into()))?;
        String::from_utf8(plaintext)
            .map_err(|_| Error::Secret("Decrypted access token is not UTF-8".into()))
    }
}
