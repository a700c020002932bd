//! Default admin credential generation.
//!
//! On first start the store creates one `admin` user so the REST layer has
//! something to authenticate against. The password is random and shown
//! once; only its Argon2id PHC hash is persisted.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Random bytes behind a generated password.
const PASSWORD_BYTES: usize = 16;

/// A freshly generated credential. `password` is the plaintext to hand to
/// the operator; `password_hash` is what gets stored.
pub struct AdminCredential {
    pub username: &'static str,
    pub role: &'static str,
    pub password: String,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random admin password and its Argon2id hash.
pub fn generate_admin_credential() -> Result<AdminCredential, argon2::password_hash::Error> {
    let mut raw = [0u8; PASSWORD_BYTES];
    OsRng.fill_bytes(&mut raw);
    let password = URL_SAFE_NO_PAD.encode(raw);

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(AdminCredential {
        username: DEFAULT_ADMIN_USERNAME,
        role: DEFAULT_ADMIN_ROLE,
        password,
        password_hash,
    })
}
