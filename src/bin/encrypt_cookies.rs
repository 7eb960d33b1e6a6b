use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::RngCore;

use fpl_assistant::session::{self, COOKIE_KEY_ENV};

/// Encrypt a plaintext cookies.json so only the encrypted copy needs to
/// live on disk. The passphrase comes from FPL_COOKIE_KEY.
///
/// Usage: encrypt_cookies [path/to/cookies.json]
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(session::COOKIE_FILE_PLAIN));
    let passphrase = env::var(COOKIE_KEY_ENV)
        .with_context(|| format!("{COOKIE_KEY_ENV} must be set to encrypt cookies"))?;

    let mut iv = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut iv);

    session::encrypt_cookie_file(&path, &passphrase, iv)?;
    let out = path.with_file_name(session::COOKIE_FILE_ENCRYPTED);
    println!("wrote {}", out.display());
    println!("the plaintext file can now be deleted");
    Ok(())
}
