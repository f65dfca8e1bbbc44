//! OpenSSL / CryptoJS "salted" passphrase envelopes:
//! `base64("Salted__" || salt[8] || AES-256-CBC(plaintext))`, with key and IV
//! derived by the legacy `EVP_BytesToKey` MD5 scheme (one iteration).

use base64::{prelude::BASE64_STANDARD, Engine};
use md5::{Digest, Md5};

use super::crypto::{self, AES256_KEY_LENGTH, AES_IV_LENGTH};
use crate::errors::{Error, Result};

pub const SALTED_MAGIC: &[u8; 8] = b"Salted__";
pub const SALT_LENGTH: usize = 8;

const HEADER_LENGTH: usize = SALTED_MAGIC.len() + SALT_LENGTH;

/// `D[0] = MD5(password || salt)`, `D[i] = MD5(D[i-1] || password || salt)`,
/// concatenated until `key_len + iv_len` bytes are available.
pub fn evp_bytes_to_key(
    password: &[u8],
    salt: &[u8],
    key_len: usize,
    iv_len: usize,
) -> (Vec<u8>, Vec<u8>) {
    let total = key_len + iv_len;
    let mut derived: Vec<u8> = Vec::with_capacity(total + Md5::output_size());
    let mut block: Vec<u8> = vec![];

    while derived.len() < total {
        let digest = Md5::new()
            .chain_update(&block)
            .chain_update(password)
            .chain_update(salt)
            .finalize();

        block = digest.to_vec();
        derived.extend_from_slice(&block);
    }

    let iv = derived[key_len..total].to_vec();
    derived.truncate(key_len);
    (derived, iv)
}

pub fn derive_key_and_iv(
    password: &[u8],
    salt: &[u8],
) -> ([u8; AES256_KEY_LENGTH], [u8; AES_IV_LENGTH]) {
    let (key_bytes, iv_bytes) =
        evp_bytes_to_key(password, salt, AES256_KEY_LENGTH, AES_IV_LENGTH);

    let mut key = [0u8; AES256_KEY_LENGTH];
    let mut iv = [0u8; AES_IV_LENGTH];
    key.copy_from_slice(&key_bytes);
    iv.copy_from_slice(&iv_bytes);
    (key, iv)
}

/// Opens a salted envelope with `password` and returns the UTF-8 plaintext.
pub fn decrypt(envelope_base64: &str, password: &str) -> Result<String> {
    let data = BASE64_STANDARD
        .decode(envelope_base64.trim())
        .map_err(|_| Error::InvalidEnvelope("not valid base64"))?;

    if data.len() < HEADER_LENGTH {
        return Err(Error::InvalidEnvelope("shorter than the salted header"));
    }

    let (header, ct) = data.split_at(HEADER_LENGTH);
    let (magic, salt) = header.split_at(SALTED_MAGIC.len());

    if magic != SALTED_MAGIC {
        return Err(Error::InvalidEnvelope("missing Salted__ marker"));
    }

    let (key, iv) = derive_key_and_iv(password.as_bytes(), salt);
    let pt = crypto::decrypt_aes256_cbc(&key, &iv, ct)?;

    String::from_utf8(pt).map_err(|e| Error::DecryptionFailed(format!("not utf-8: {e}")))
}

/// Inverse of [`decrypt`] for a caller-chosen salt.
pub fn encrypt(plaintext: &str, password: &str, salt: &[u8; SALT_LENGTH]) -> String {
    let (key, iv) = derive_key_and_iv(password.as_bytes(), salt);
    let ct = crypto::encrypt_aes256_cbc(&key, &iv, plaintext.as_bytes());

    let mut data = Vec::with_capacity(HEADER_LENGTH + ct.len());
    data.extend_from_slice(SALTED_MAGIC);
    data.extend_from_slice(salt);
    data.extend_from_slice(&ct);

    BASE64_STANDARD.encode(data)
}
