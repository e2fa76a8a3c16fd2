use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per session token (64 hex characters)
pub const TOKEN_BYTES: usize = 32;

/// New session token drawn from the operating system's CSPRNG
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
