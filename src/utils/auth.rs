/// Compare a submitted password with the stored one.
///
/// Passwords are kept in plaintext; the comparison is byte-exact and runs in
/// time independent of where the first mismatch occurs.
pub fn passwords_match(provided: &str, stored: &str) -> bool {
    provided.len() == stored.len()
        && provided
            .as_bytes()
            .iter()
            .zip(stored.as_bytes().iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
