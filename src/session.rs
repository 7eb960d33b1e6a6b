use std::fs;
use std::path::Path;

use aes::Aes256;
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use pbkdf2::pbkdf2_hmac;
use serde_json::Value;
use sha2::Sha256;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const PBKDF2_ITERATIONS: u32 = 10_000;
const KEY_SALT: &str = "fpl_assistant.cookies.v1";

pub const COOKIE_FILE_PLAIN: &str = "cookies.json";
pub const COOKIE_FILE_ENCRYPTED: &str = "cookies.enc";
pub const COOKIE_KEY_ENV: &str = "FPL_COOKIE_KEY";

/// Browser session cookies for the authenticated FPL endpoints.
#[derive(Debug, Clone, Default)]
pub struct SessionCookies {
    pairs: Vec<(String, String)>,
}

impl SessionCookies {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Parse a `{"name": "value", ...}` cookie export. Non-string values are
    /// skipped rather than failing the whole file.
    pub fn from_json(raw: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(raw).context("invalid cookies json")?;
        let obj = v
            .as_object()
            .context("cookies json must be an object of name -> value")?;
        let mut pairs = Vec::new();
        for (name, value) in obj {
            if let Some(value) = value.as_str() {
                pairs.push((name.clone(), value.to_string()));
            }
        }
        Ok(Self { pairs })
    }
}

/// Load session cookies from `dir`, preferring the plaintext file. The
/// encrypted variant needs the passphrase from [`COOKIE_KEY_ENV`]. Returns
/// Ok(None) when neither file exists: running without a roster is normal.
pub fn load_cookies(dir: &Path) -> Result<Option<SessionCookies>> {
    let plain = dir.join(COOKIE_FILE_PLAIN);
    if plain.is_file() {
        let raw = fs::read_to_string(&plain)
            .with_context(|| format!("read {}", plain.display()))?;
        return SessionCookies::from_json(&raw).map(Some);
    }

    let encrypted = dir.join(COOKIE_FILE_ENCRYPTED);
    if encrypted.is_file() {
        let passphrase = std::env::var(COOKIE_KEY_ENV)
            .with_context(|| format!("{COOKIE_KEY_ENV} not set but {COOKIE_FILE_ENCRYPTED} exists"))?;
        let body = fs::read_to_string(&encrypted)
            .with_context(|| format!("read {}", encrypted.display()))?;
        let plain = decrypt_cookie_blob(&body, &passphrase)?;
        return SessionCookies::from_json(&plain).map(Some);
    }

    Ok(None)
}

/// Encrypt a plaintext cookie export and write it next to it as
/// [`COOKIE_FILE_ENCRYPTED`]. The IV must be 16 fresh random bytes.
pub fn encrypt_cookie_file(plain_path: &Path, passphrase: &str, iv: [u8; 16]) -> Result<()> {
    let raw = fs::read_to_string(plain_path)
        .with_context(|| format!("read {}", plain_path.display()))?;
    // Validate before encrypting so a bad export fails loudly now.
    SessionCookies::from_json(&raw)?;
    let blob = encrypt_cookie_blob(&raw, passphrase, iv);
    let out = plain_path.with_file_name(COOKIE_FILE_ENCRYPTED);
    fs::write(&out, blob).with_context(|| format!("write {}", out.display()))?;
    Ok(())
}

/// Encrypted blob layout: outer base64 of `<base64_ciphertext>:<hex_iv>`,
/// AES-256-CBC with PKCS7 padding, key from PBKDF2-HMAC-SHA256.
pub fn encrypt_cookie_blob(plain: &str, passphrase: &str, iv: [u8; 16]) -> String {
    let key = derive_key(passphrase);

    let plain_bytes = plain.as_bytes();
    let padded_len = plain_bytes.len() + 16 - (plain_bytes.len() % 16);
    let mut buf = vec![0u8; padded_len];
    buf[..plain_bytes.len()].copy_from_slice(plain_bytes);
    let encryptor = Aes256CbcEnc::new(&key.into(), &iv.into());
    let ciphertext = encryptor
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plain_bytes.len())
        .expect("padded buffer sized for pkcs7");

    let inner = format!("{}:{}", BASE64.encode(ciphertext), hex_encode(&iv));
    BASE64.encode(inner.as_bytes())
}

pub fn decrypt_cookie_blob(body: &str, passphrase: &str) -> Result<String> {
    let decoded = BASE64
        .decode(body.trim().as_bytes())
        .context("outer base64 decode failed")?;
    let decoded_str = String::from_utf8(decoded).context("outer base64 not utf8")?;

    let (ct_b64, iv_hex) = decoded_str
        .rsplit_once(':')
        .context("expected ciphertext:iv format")?;

    let ciphertext = BASE64
        .decode(ct_b64.as_bytes())
        .context("ciphertext base64 decode failed")?;
    let iv = hex_decode(iv_hex).context("iv hex decode failed")?;
    if iv.len() != 16 {
        return Err(anyhow::anyhow!("IV must be 16 bytes, got {}", iv.len()));
    }

    let key = derive_key(passphrase);
    let iv_arr: [u8; 16] = iv.try_into().expect("length checked above");
    let mut buf = ciphertext;
    let decryptor = Aes256CbcDec::new(&key.into(), &iv_arr.into());
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|e| anyhow::anyhow!("AES decrypt failed: {e}"))?;

    String::from_utf8(plaintext.to_vec()).context("decrypted payload is not utf8")
}

fn derive_key(passphrase: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        KEY_SALT.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    key
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        return Err(anyhow::anyhow!("odd-length hex string"));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).context("invalid hex byte"))
        .collect()
}
