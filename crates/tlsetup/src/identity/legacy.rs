//! RFC 1423 encrypted PEM blocks (`Proc-Type: 4,ENCRYPTED` + `DEK-Info`).
//!
//! This is the OpenSSL "traditional" key encryption: CBC mode, key derived
//! with `EVP_BytesToKey` (MD5, one round) salted with the first eight IV
//! bytes.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockCipher, BlockDecryptMut, KeyInit, KeyIvInit};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

/// Header naming the cipher and IV of an encrypted block.
pub const DEK_INFO: &str = "DEK-Info";

const SALT_LEN: usize = 8;

/// Ciphers accepted in a `DEK-Info` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyCipher {
    DesCbc,
    DesEde3Cbc,
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

static CIPHER_NAMES: &[(&str, LegacyCipher)] = &[
    ("DES-CBC", LegacyCipher::DesCbc),
    ("DES-EDE3-CBC", LegacyCipher::DesEde3Cbc),
    ("AES-128-CBC", LegacyCipher::Aes128Cbc),
    ("AES-192-CBC", LegacyCipher::Aes192Cbc),
    ("AES-256-CBC", LegacyCipher::Aes256Cbc),
];

impl LegacyCipher {
    fn from_name(name: &str) -> Option<Self> {
        CIPHER_NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|(_, cipher)| *cipher)
    }

    fn key_len(self) -> usize {
        match self {
            Self::DesCbc => 8,
            Self::DesEde3Cbc => 24,
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc => 32,
        }
    }

    fn block_len(self) -> usize {
        match self {
            Self::DesCbc | Self::DesEde3Cbc => 8,
            Self::Aes128Cbc | Self::Aes192Cbc | Self::Aes256Cbc => 16,
        }
    }

    fn decrypt(self, key: &[u8], iv: &[u8], data: &[u8]) -> Option<Vec<u8>> {
        match self {
            Self::DesCbc => cbc_decrypt::<des::Des>(key, iv, data),
            Self::DesEde3Cbc => cbc_decrypt::<des::TdesEde3>(key, iv, data),
            Self::Aes128Cbc => cbc_decrypt::<aes::Aes128>(key, iv, data),
            Self::Aes192Cbc => cbc_decrypt::<aes::Aes192>(key, iv, data),
            Self::Aes256Cbc => cbc_decrypt::<aes::Aes256>(key, iv, data),
        }
    }
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Option<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    cbc::Decryptor::<C>::new_from_slices(key, iv)
        .ok()?
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .ok()
}

/// Parsed `DEK-Info` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DekInfo {
    cipher: LegacyCipher,
    iv: Vec<u8>,
}

impl DekInfo {
    /// Parse `"<CIPHER>,<hex IV>"`.
    pub fn parse(value: &str) -> Result<Self, String> {
        let (name, iv_hex) = value
            .split_once(',')
            .ok_or_else(|| format!("malformed {DEK_INFO} header"))?;

        let cipher = LegacyCipher::from_name(name.trim())
            .ok_or_else(|| format!("unsupported cipher {:?}", name.trim()))?;
        let iv = hex::decode(iv_hex.trim()).map_err(|e| format!("invalid IV: {e}"))?;

        if iv.len() != cipher.block_len() {
            return Err(format!(
                "IV is {} bytes, {} expected for {}",
                iv.len(),
                cipher.block_len(),
                name.trim()
            ));
        }
        Ok(Self { cipher, iv })
    }
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration.
fn derive_key(password: &[u8], salt: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(len + 16));
    let mut previous: Option<Zeroizing<Vec<u8>>> = None;

    while key.len() < len {
        let mut hasher = Md5::new();
        if let Some(prev) = &previous {
            hasher.update(prev.as_slice());
        }
        hasher.update(password);
        hasher.update(salt);
        let digest = Zeroizing::new(hasher.finalize().to_vec());
        key.extend_from_slice(&digest);
        previous = Some(digest);
    }

    key.truncate(len);
    key
}

/// Decrypt an encrypted block body.
///
/// `None` means the password is wrong: either the padding is invalid or the
/// plaintext is not a single DER SEQUENCE.
pub fn decrypt(dek: &DekInfo, password: &[u8], ciphertext: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if ciphertext.is_empty() || ciphertext.len() % dek.cipher.block_len() != 0 {
        return None;
    }

    let salt = dek.iv.get(..SALT_LEN)?;
    let key = derive_key(password, salt, dek.cipher.key_len());
    let plaintext = Zeroizing::new(dek.cipher.decrypt(&key, &dek.iv, ciphertext)?);

    is_der_sequence(&plaintext).then_some(plaintext)
}

/// True if `bytes` is exactly one DER SEQUENCE.
fn is_der_sequence(bytes: &[u8]) -> bool {
    let [0x30, first, rest @ ..] = bytes else {
        return false;
    };

    let (len, body) = if *first < 0x80 {
        (usize::from(*first), rest)
    } else {
        let count = usize::from(first & 0x7f);
        if count == 0 || count > 4 || rest.len() < count {
            return false;
        }
        let (len_bytes, body) = rest.split_at(count);
        let len = len_bytes
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
        (len, body)
    };

    body.len() == len
}
