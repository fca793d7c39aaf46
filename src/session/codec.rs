//! Session cookie cipher
//!
//! AES-CBC with PKCS#7 padding and a fixed all-zero IV, hex encoded.
//! The key length (16, 24 or 32 bytes) selects AES-128, AES-192 or AES-256.
//!
//! The zero IV keeps cookies issued by earlier deployments readable, but it
//! makes encryption deterministic: two payloads sharing a prefix produce
//! ciphertexts sharing the corresponding leading blocks.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;

use crate::error::Error;

const ZERO_IV: [u8; 16] = [0; 16];

/// Lengths accepted for a session secret
pub const VALID_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid key length: {0}")]
    InvalidKeyLength(usize),
    #[error("ciphertext is not valid hex")]
    InvalidHex,
    #[error("ciphertext padding is invalid")]
    InvalidPadding,
    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// A session secret whose length has been validated
#[derive(Clone)]
pub struct SessionKey(Vec<u8>);

impl SessionKey {
    /// Validate a configured secret; the error carries a usable suggestion
    pub fn new(secret: &str) -> Result<Self, Error> {
        let bytes = secret.as_bytes();
        if VALID_KEY_LENGTHS.contains(&bytes.len()) {
            Ok(Self(bytes.to_vec()))
        } else {
            Err(Error::InvalidSessionSecret {
                len: bytes.len(),
                suggestion: generate_secret(),
            })
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        encrypt(plaintext, &self.0)
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError> {
        decrypt(ciphertext, &self.0)
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey({} bytes)", self.0.len())
    }
}

/// Random 32 character alphanumeric secret
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String, CodecError> {
    let ciphertext = match key.len() {
        16 => encrypt_cbc::<cbc::Encryptor<aes::Aes128>>(key, plaintext.as_bytes())?,
        24 => encrypt_cbc::<cbc::Encryptor<aes::Aes192>>(key, plaintext.as_bytes())?,
        32 => encrypt_cbc::<cbc::Encryptor<aes::Aes256>>(key, plaintext.as_bytes())?,
        len => return Err(CodecError::InvalidKeyLength(len)),
    };
    Ok(hex::encode(ciphertext))
}

pub fn decrypt(ciphertext: &str, key: &[u8]) -> Result<String, CodecError> {
    let bytes = hex::decode(ciphertext).map_err(|_| CodecError::InvalidHex)?;
    let plaintext = match key.len() {
        16 => decrypt_cbc::<cbc::Decryptor<aes::Aes128>>(key, &bytes)?,
        24 => decrypt_cbc::<cbc::Decryptor<aes::Aes192>>(key, &bytes)?,
        32 => decrypt_cbc::<cbc::Decryptor<aes::Aes256>>(key, &bytes)?,
        len => return Err(CodecError::InvalidKeyLength(len)),
    };
    String::from_utf8(plaintext).map_err(|_| CodecError::InvalidUtf8)
}

fn encrypt_cbc<E>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CodecError>
where
    E: KeyIvInit + BlockEncryptMut,
{
    let cipher =
        E::new_from_slices(key, &ZERO_IV).map_err(|_| CodecError::InvalidKeyLength(key.len()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_cbc<D>(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CodecError>
where
    D: KeyIvInit + BlockDecryptMut,
{
    let cipher =
        D::new_from_slices(key, &ZERO_IV).map_err(|_| CodecError::InvalidKeyLength(key.len()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CodecError::InvalidPadding)
}
