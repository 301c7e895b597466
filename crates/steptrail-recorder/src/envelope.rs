//! Versioned session envelope.
//!
//! Layout before encoding:
//!
//! ```text
//! version (1) | unix seconds, big endian (8) | iv (16) | ciphertext | hmac-sha256 (32)
//! ```
//!
//! The ciphertext is AES-128-CBC with PKCS#7 padding. The tag covers every
//! preceding byte. The whole byte string is base64url encoded without
//! padding; padded input is accepted when opening.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use steptrail_config::EnvelopeConfig;

use crate::error::EnvelopeError;

pub const VERSION: u8 = 0x80;

const TIMESTAMP_LEN: usize = 8;
const IV_LEN: usize = 16;
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + IV_LEN;
const BLOCK_LEN: usize = 16;
const TAG_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// PBKDF2-HMAC-SHA256 parameters for turning an access token into a key.
#[derive(Debug, Clone)]
pub struct KeyDerivation {
    salt: String,
    iterations: u32,
}

impl KeyDerivation {
    pub fn new(salt: impl Into<String>, iterations: u32) -> Self {
        Self {
            salt: salt.into(),
            iterations,
        }
    }

    pub fn from_config(config: &EnvelopeConfig) -> Self {
        Self::new(config.salt.clone(), config.iterations)
    }

    /// Characters 10..22 followed by characters 15..27 of the token,
    /// clamped to its length.
    pub fn key_material(access_token: &str) -> String {
        let chars: Vec<char> = access_token.chars().collect();
        let slice = |start: usize, end: usize| -> String {
            let end = end.min(chars.len());
            let start = start.min(end);
            chars[start..end].iter().collect()
        };
        format!("{}{}", slice(10, 22), slice(15, 27))
    }

    pub fn derive(&self, access_token: &str) -> DerivedKey {
        let material = Self::key_material(access_token);
        let mut output = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            material.as_bytes(),
            self.salt.as_bytes(),
            self.iterations,
            &mut output,
        );
        DerivedKey::from_bytes(output)
    }
}

/// 32-byte derived key: signing half, then encryption half.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    signing: [u8; 16],
    encryption: [u8; 16],
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let mut signing = [0u8; 16];
        let mut encryption = [0u8; 16];
        signing.copy_from_slice(&bytes[..16]);
        encryption.copy_from_slice(&bytes[16..]);
        Self {
            signing,
            encryption,
        }
    }

    fn mac(&self) -> Result<HmacSha256, EnvelopeError> {
        <HmacSha256 as Mac>::new_from_slice(&self.signing)
            .map_err(|e| EnvelopeError::InvalidKey(e.to_string()))
    }

    /// Seal with a random IV and the current time.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, EnvelopeError> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        let timestamp = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        self.seal_with(plaintext, iv, timestamp)
    }

    /// Seal with an explicit IV and timestamp.
    pub fn seal_with(
        &self,
        plaintext: &[u8],
        iv: [u8; IV_LEN],
        timestamp: u64,
    ) -> Result<String, EnvelopeError> {
        let ciphertext = Aes128CbcEnc::new(&self.encryption.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
        body.push(VERSION);
        body.extend_from_slice(&timestamp.to_be_bytes());
        body.extend_from_slice(&iv);
        body.extend_from_slice(&ciphertext);

        let mut mac = self.mac()?;
        mac.update(&body);
        body.extend_from_slice(&mac.finalize().into_bytes());

        Ok(URL_SAFE_NO_PAD.encode(body))
    }

    /// Verify and decrypt an envelope.
    pub fn open(&self, envelope: &str) -> Result<OpenedEnvelope, EnvelopeError> {
        let bytes = URL_SAFE_NO_PAD.decode(envelope.trim().trim_end_matches('='))?;
        if bytes.len() < HEADER_LEN + BLOCK_LEN + TAG_LEN {
            return Err(EnvelopeError::Malformed(format!(
                "{} bytes is shorter than the minimum envelope",
                bytes.len()
            )));
        }
        if bytes[0] != VERSION {
            return Err(EnvelopeError::UnsupportedVersion(bytes[0]));
        }

        let (body, tag) = bytes.split_at(bytes.len() - TAG_LEN);
        let mut mac = self.mac()?;
        mac.update(body);
        mac.verify_slice(tag)
            .map_err(|_| EnvelopeError::AuthenticationFailed)?;

        let mut timestamp = [0u8; TIMESTAMP_LEN];
        timestamp.copy_from_slice(&body[1..1 + TIMESTAMP_LEN]);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&body[1 + TIMESTAMP_LEN..HEADER_LEN]);

        let ciphertext = &body[HEADER_LEN..];
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(EnvelopeError::Malformed(
                "ciphertext is not block aligned".to_string(),
            ));
        }
        let plaintext = Aes128CbcDec::new(&self.encryption.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| EnvelopeError::Decryption("invalid padding".to_string()))?;

        Ok(OpenedEnvelope {
            timestamp: u64::from_be_bytes(timestamp),
            plaintext,
        })
    }
}

/// Contents of a verified envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedEnvelope {
    /// Unix seconds at sealing time.
    pub timestamp: u64,
    pub plaintext: Vec<u8>,
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
