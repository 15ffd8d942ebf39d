//! AES-128-CBC segment decryption (the `METHOD=AES-128` HLS scheme).

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes128CbcEnc = cbc::Encryptor<Aes128>;

#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("key must be 16 bytes, got {0}")]
    KeyLength(usize),
    #[error("ciphertext length {0} is not a multiple of the block size")]
    BlockLength(usize),
    #[error("invalid padding")]
    Padding,
}

/// Decrypts `data` with AES-128-CBC and strips PKCS#7 padding.
pub fn aes128_cbc_decrypt(data: &[u8], key: &[u8], iv: &[u8; 16]) -> Result<Vec<u8>, DecryptError> {
    if key.len() != 16 {
        return Err(DecryptError::KeyLength(key.len()));
    }
    if data.len() % 16 != 0 {
        return Err(DecryptError::BlockLength(data.len()));
    }
    let cipher =
        Aes128CbcDec::new_from_slices(key, iv).map_err(|_| DecryptError::KeyLength(key.len()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| DecryptError::Padding)
}

/// Encrypts `data` with AES-128-CBC and PKCS#7 padding. Inverse of [`aes128_cbc_decrypt`].
pub fn aes128_cbc_encrypt(data: &[u8], key: &[u8], iv: &[u8; 16]) -> Result<Vec<u8>, DecryptError> {
    let cipher =
        Aes128CbcEnc::new_from_slices(key, iv).map_err(|_| DecryptError::KeyLength(key.len()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

/// Parses an `IV=0x...` attribute value into 16 bytes.
///
/// The `0x`/`0X` prefix is optional; shorter values are left-padded with zeros.
pub fn parse_iv(text: &str) -> Option<[u8; 16]> {
    let hex_part = text
        .trim()
        .strip_prefix("0x")
        .or_else(|| text.trim().strip_prefix("0X"))
        .unwrap_or(text.trim());
    if hex_part.is_empty() || hex_part.len() > 32 {
        return None;
    }
    let padded = format!("{:0>32}", hex_part);
    let bytes = hex::decode(padded).ok()?;
    bytes.try_into().ok()
}

/// IV derived from a media sequence number: the number as a 128-bit big-endian integer.
pub fn iv_from_sequence(sequence: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[8..].copy_from_slice(&sequence.to_be_bytes());
    iv
}
