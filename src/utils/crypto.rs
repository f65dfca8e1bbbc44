use cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::errors::{Error, Result};

pub const AES256_KEY_LENGTH: usize = 32;
pub const AES_IV_LENGTH: usize = 16;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

/// AES-256-CBC with PKCS#7 padding. A wrong key almost always surfaces here
/// as a padding error.
pub fn decrypt_aes256_cbc(
    key: &[u8; AES256_KEY_LENGTH],
    iv: &[u8; AES_IV_LENGTH],
    ct: &[u8],
) -> Result<Vec<u8>> {
    if ct.is_empty() || ct.len() % AES_IV_LENGTH != 0 {
        return Err(Error::DecryptionFailed(format!(
            "ciphertext length {} is not a positive multiple of the block size",
            ct.len()
        )));
    }

    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ct)
        .map_err(|_| Error::DecryptionFailed("invalid padding".into()))
}

pub fn encrypt_aes256_cbc(
    key: &[u8; AES256_KEY_LENGTH],
    iv: &[u8; AES_IV_LENGTH],
    pt: &[u8],
) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(pt)
}
