use rand::RngCore;

/// Length of generated display names.
pub const DISPLAY_NAME_LEN: usize = 7;

/// Random display name for the forced-rename prompt: 4 random bytes, hex encoded,
/// cut to [`DISPLAY_NAME_LEN`] characters.
pub fn random_display_name() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut name = hex::encode(bytes);
    name.truncate(DISPLAY_NAME_LEN);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_short_lowercase_hex() {
        let name = random_display_name();
        assert_eq!(name.len(), DISPLAY_NAME_LEN);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
