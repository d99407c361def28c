//! Signing identity loading
//!
//! The secrets file carries exactly two lines: the key blob (an encrypted
//! JSON keystore or a raw hex private key) and the keystore passphrase.

use std::io::Write;
use std::path::Path;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use tracing::debug;

use crate::error::{FeederError, Result};

/// Raw contents of the secrets file
pub struct Secrets {
    pub key: String,
    pub password: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secrets { .. }")
    }
}

/// Read and shape-check the secrets file. Touches nothing but the filesystem.
pub fn read_secrets(path: impl AsRef<Path>) -> Result<Secrets> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| FeederError::SecretsIo {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&str> = contents.lines().collect();
    if lines.len() != 2 {
        return Err(FeederError::MalformedSecrets(lines.len()));
    }

    Ok(Secrets {
        key: lines[0].to_string(),
        password: lines[1].to_string(),
    })
}

/// Unlocked transaction signer bound to one account and one chain
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    wallet: LocalWallet,
}

impl SigningIdentity {
    pub fn load(path: impl AsRef<Path>, chain_id: u64) -> Result<Self> {
        let secrets = read_secrets(path)?;
        Self::from_secrets(&secrets, chain_id)
    }

    pub fn from_secrets(secrets: &Secrets, chain_id: u64) -> Result<Self> {
        let blob = secrets.key.trim();
        let wallet = if blob.starts_with('{') {
            decrypt_keystore(blob, &secrets.password)?
        } else {
            blob.parse::<LocalWallet>()
                .map_err(|e| FeederError::SigningKey(e.to_string()))?
        };
        let wallet = wallet.with_chain_id(chain_id);
        debug!(address = %format!("{:#x}", wallet.address()), chain_id, "Signing identity unlocked");
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

/// The keystore decoder reads from disk, so stage the blob in a private
/// temporary file that is removed on drop.
fn decrypt_keystore(blob: &str, password: &str) -> Result<LocalWallet> {
    let mut staged =
        tempfile::NamedTempFile::new().map_err(|e| FeederError::SigningKey(e.to_string()))?;
    staged
        .write_all(blob.as_bytes())
        .and_then(|_| staged.flush())
        .map_err(|e| FeederError::SigningKey(e.to_string()))?;

    LocalWallet::decrypt_keystore(staged.path(), password)
        .map_err(|e| FeederError::SigningKey(e.to_string()))
}
