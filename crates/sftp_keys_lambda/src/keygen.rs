use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use ssh_key::public::{KeyData, RsaPublicKey};
use ssh_key::{HashAlg, PublicKey};

use crate::error::KeyManagementError;

pub const RSA_KEY_BITS: usize = 2048;

/// A freshly generated SSH key pair. The private half is never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key_pem: String,
    pub public_key_openssh: String,
    pub comment: String,
    pub fingerprint: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key_openssh", &self.public_key_openssh)
            .field("comment", &self.comment)
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Generates an RSA-2048 key pair (public exponent 65537).
///
/// The private key is PKCS#1 PEM (`BEGIN RSA PRIVATE KEY`), the public key a
/// single OpenSSH line `ssh-rsa <base64> <comment>`.
pub fn generate_key_pair(comment: &str) -> Result<KeyPair, KeyManagementError> {
    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)?;
    let private_key_pem = private_key.to_pkcs1_pem(LineEnding::LF)?.to_string();

    let key_data = KeyData::Rsa(RsaPublicKey::try_from(private_key.to_public_key())?);
    let public_key = PublicKey::new(key_data, comment);

    Ok(KeyPair {
        private_key_pem,
        public_key_openssh: public_key.to_openssh()?,
        comment: comment.to_string(),
        fingerprint: public_key.fingerprint(HashAlg::Sha256).to_string(),
    })
}
