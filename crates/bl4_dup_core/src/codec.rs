//! Save container codec.
//!
//! The pipeline only talks to [`SaveCodec`]. [`Bl4Codec`] is the container
//! format written by the game: zlib-compressed YAML with an adler32/length
//! footer, PKCS#7 padded and AES-256-ECB encrypted under a key derived from
//! the account id.

use std::io::{self, Read, Write};

use adler::adler32_slice;
use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use thiserror::Error;

const BLOCK_SIZE: usize = 16;
const FOOTER_LEN: usize = 8;
const BASE_KEY: [u8; 32] = [
    0x35, 0xEC, 0x33, 0x77, 0xF3, 0x5D, 0xB0, 0xEA, 0xBE, 0x6B, 0x83, 0x11, 0x54, 0x03, 0xEB, 0xFB,
    0x27, 0x25, 0x64, 0x2E, 0xD5, 0x49, 0x06, 0x29, 0x05, 0x78, 0xBD, 0x60, 0xBA, 0x4A, 0xA7, 0x87,
];

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("account id `{0}` contains no digits")]
    InvalidKeyId(String),
    #[error("account id `{0}` does not fit in 64 bits")]
    KeyIdOutOfRange(String),
    #[error("container size {0} is not a multiple of 16")]
    InvalidLength(usize),
    #[error("corrupt deflate stream (zlib: {zlib}; deflate: {deflate})")]
    Inflate { zlib: io::Error, deflate: io::Error },
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Checksum { expected: u32, actual: u32 },
    #[error("length mismatch: expected {expected}, got {actual}")]
    Length { expected: u32, actual: usize },
    #[error("plaintext of {0} bytes is too large for the container footer")]
    TooLarge(usize),
    #[error("compression failed: {0}")]
    Compress(#[source] io::Error),
}

/// Opaque encode/decode contract used by the load and persist pipelines.
pub trait SaveCodec {
    fn decode(&self, container: &[u8], key_id: &str) -> Result<Vec<u8>, CodecError>;
    fn encode(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, CodecError>;
}

impl<C: SaveCodec + ?Sized> SaveCodec for &C {
    fn decode(&self, container: &[u8], key_id: &str) -> Result<Vec<u8>, CodecError> {
        (**self).decode(container, key_id)
    }

    fn encode(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, CodecError> {
        (**self).encode(plaintext, key_id)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Bl4Codec;

impl Bl4Codec {
    pub fn new() -> Self {
        Self
    }
}

impl SaveCodec for Bl4Codec {
    fn decode(&self, container: &[u8], key_id: &str) -> Result<Vec<u8>, CodecError> {
        if container.len() % BLOCK_SIZE != 0 {
            return Err(CodecError::InvalidLength(container.len()));
        }

        let key = derive_key(key_id)?;
        let mut buffer = container.to_vec();
        aes_ecb_decrypt(&mut buffer, &key);

        let body = pkcs7_unpad(&buffer).unwrap_or(&buffer[..]);
        let plaintext = inflate(body)?;

        if body.len() >= FOOTER_LEN {
            let footer = &body[body.len() - FOOTER_LEN..];
            let expected = u32::from_be_bytes([footer[0], footer[1], footer[2], footer[3]]);
            let actual = adler32_slice(&plaintext);
            if actual != expected {
                return Err(CodecError::Checksum { expected, actual });
            }
            let expected_len = u32::from_le_bytes([footer[4], footer[5], footer[6], footer[7]]);
            if plaintext.len() != expected_len as usize {
                return Err(CodecError::Length {
                    expected: expected_len,
                    actual: plaintext.len(),
                });
            }
        }

        Ok(plaintext)
    }

    fn encode(&self, plaintext: &[u8], key_id: &str) -> Result<Vec<u8>, CodecError> {
        let key = derive_key(key_id)?;
        let plain_len =
            u32::try_from(plaintext.len()).map_err(|_| CodecError::TooLarge(plaintext.len()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
        encoder.write_all(plaintext).map_err(CodecError::Compress)?;
        let mut body = encoder.finish().map_err(CodecError::Compress)?;
        body.extend_from_slice(&adler32_slice(plaintext).to_be_bytes());
        body.extend_from_slice(&plain_len.to_le_bytes());

        let mut padded = pkcs7_pad(&body);
        aes_ecb_encrypt(&mut padded, &key);
        Ok(padded)
    }
}

/// Derives the AES key for an account id from the digits it contains.
pub fn derive_key(key_id: &str) -> Result<[u8; 32], CodecError> {
    let digits: String = key_id.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(CodecError::InvalidKeyId(key_id.to_string()));
    }
    let id = digits
        .parse::<u64>()
        .map_err(|_| CodecError::KeyIdOutOfRange(key_id.to_string()))?;

    let mut key = BASE_KEY;
    for (byte, id_byte) in key.iter_mut().zip(id.to_le_bytes()) {
        *byte ^= id_byte;
    }
    Ok(key)
}

fn inflate(body: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    let zlib = match ZlibDecoder::new(body).read_to_end(&mut out) {
        Ok(_) => return Ok(out),
        Err(e) => e,
    };

    out.clear();
    match DeflateDecoder::new(body).read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(deflate) => Err(CodecError::Inflate { zlib, deflate }),
    }
}

fn aes_ecb_encrypt(data: &mut [u8], key: &[u8; 32]) {
    let cipher = Aes256::new(GenericArray::from_slice(key));
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(chunk));
    }
}

fn aes_ecb_decrypt(data: &mut [u8], key: &[u8; 32]) {
    let cipher = Aes256::new(GenericArray::from_slice(key));
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(chunk));
    }
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.resize(data.len() + pad_len, pad_len as u8);
    out
}

fn pkcs7_unpad(data: &[u8]) -> Option<&[u8]> {
    let pad_len = *data.last()? as usize;
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > data.len() {
        return None;
    }
    let (body, padding) = data.split_at(data.len() - pad_len);
    padding
        .iter()
        .all(|&byte| byte as usize == pad_len)
        .then_some(body)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use adler::adler32_slice;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;

    use super::{
        Bl4Codec, CodecError, SaveCodec, aes_ecb_decrypt, aes_ecb_encrypt, derive_key, pkcs7_pad,
        pkcs7_unpad,
    };

    const KEY_ID: &str = "76561198000000000";

    fn seal(body: &[u8]) -> Vec<u8> {
        let mut padded = pkcs7_pad(body);
        aes_ecb_encrypt(&mut padded, &derive_key(KEY_ID).expect("key"));
        padded
    }

    fn raw_deflate(plain: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plain).expect("deflate");
        encoder.finish().expect("deflate finish")
    }

    #[test]
    fn aes_ecb_matches_nist_vector() {
        let key: [u8; 32] = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ];
        let plain: [u8; 16] = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected: [u8; 16] = [
            0xf3, 0xee, 0xd1, 0xbd, 0xb5, 0xd2, 0xa0, 0x3c, 0x06, 0x4b, 0x5a, 0x7e, 0x3d, 0xb1,
            0x81, 0xf8,
        ];

        let mut block = plain;
        aes_ecb_encrypt(&mut block, &key);
        assert_eq!(block, expected);
        aes_ecb_decrypt(&mut block, &key);
        assert_eq!(block, plain);
    }

    #[test]
    fn pkcs7_pads_full_block_when_aligned() {
        let padded = pkcs7_pad(&[7u8; 16]);
        assert_eq!(padded.len(), 32);
        assert!(padded[16..].iter().all(|&b| b == 16));
        assert_eq!(pkcs7_unpad(&padded), Some(&[7u8; 16][..]));
    }

    #[test]
    fn pkcs7_unpad_rejects_inconsistent_padding() {
        let mut data = vec![0u8; 16];
        data[15] = 3;
        data[14] = 3;
        data[13] = 2;
        assert_eq!(pkcs7_unpad(&data), None);
        assert_eq!(pkcs7_unpad(&[]), None);
    }

    #[test]
    fn decodes_raw_deflate_bodies() {
        let plain = b"state:\n  char_name: Raw\n";
        let mut body = raw_deflate(plain);
        body.extend_from_slice(&adler32_slice(plain).to_be_bytes());
        body.extend_from_slice(&(plain.len() as u32).to_le_bytes());

        let decoded = Bl4Codec.decode(&seal(&body), KEY_ID).expect("decode");
        assert_eq!(decoded, plain);
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let plain = b"a: 1\n";
        let mut body = raw_deflate(plain);
        body.extend_from_slice(&(adler32_slice(plain) ^ 1).to_be_bytes());
        body.extend_from_slice(&(plain.len() as u32).to_le_bytes());

        let err = Bl4Codec.decode(&seal(&body), KEY_ID).expect_err("bad checksum");
        assert!(matches!(err, CodecError::Checksum { .. }), "{err}");
    }

    #[test]
    fn rejects_length_mismatch() {
        let plain = b"a: 1\n";
        let mut body = raw_deflate(plain);
        body.extend_from_slice(&adler32_slice(plain).to_be_bytes());
        body.extend_from_slice(&(plain.len() as u32 + 1).to_le_bytes());

        let err = Bl4Codec.decode(&seal(&body), KEY_ID).expect_err("bad length");
        assert!(matches!(err, CodecError::Length { .. }), "{err}");
    }
}
