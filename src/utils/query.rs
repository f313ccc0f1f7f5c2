/// Length of a string after form-style URL encoding (spaces become `+`, one
/// byte each; other reserved bytes become `%XX`).
///
/// Query budget checks only need lengths, never the encoded text itself.
pub(crate) fn form_encoded_len(value: &str) -> usize {
    let encoded = urlencoding::encode(value);
    // `encode` writes spaces as `%20`; form encoding writes `+`.
    encoded.len() - 2 * value.matches(' ').count()
}

#[cfg(test)]
mod tests {
    use super::form_encoded_len;

    #[test]
    fn plain_ascii_is_unchanged() {
        assert_eq!(form_encoded_len("ADAMTS5"), 7);
    }

    #[test]
    fn spaces_count_as_one_byte() {
        assert_eq!(form_encoded_len("ADAMTS 5"), 8);
    }

    #[test]
    fn reserved_characters_expand_to_three_bytes() {
        // quote -> %22
        assert_eq!(form_encoded_len("\"a\""), 7);
    }

    #[test]
    fn multibyte_characters_expand_per_byte() {
        // α is two UTF-8 bytes -> %CE%B1
        assert_eq!(form_encoded_len("α"), 6);
    }
}
