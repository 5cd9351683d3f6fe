/// Fingerprint a header row as a short hex string.
///
/// Headers are joined with `|` and folded one UTF-16 code unit at a time as
/// `hash = ((hash << 5) - hash) + code` with wrapping 32-bit signed
/// arithmetic. Negative hashes render with a leading `-` rather than being
/// normalized to unsigned. Identical header sequences always produce the same
/// value; this is not cryptographic and collisions are acceptable - it only
/// guards saved checkbox state against a table whose columns changed shape.
pub fn header_checksum(headers: &[String]) -> String {
    let joined = headers.join("|");

    let mut hash: i32 = 0;
    for code in joined.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(code as i32);
    }

    if hash < 0 {
        format!("-{:x}", (hash as i64).unsigned_abs())
    } else {
        format!("{:x}", hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn known_values() {
        assert_eq!(header_checksum(&headers(&["a", "b"])), "17b87");
        assert_eq!(header_checksum(&headers(&["name", "done"])), "4b1cea53");
    }

    #[test]
    fn empty_headers_hash_to_zero() {
        assert_eq!(header_checksum(&[]), "0");
    }

    #[test]
    fn deterministic_for_identical_headers() {
        let h1 = headers(&["h1", "h2", "chkA", "chkB"]);
        let h2 = headers(&["h1", "h2", "chkA", "chkB"]);
        assert_eq!(header_checksum(&h1), header_checksum(&h2));
    }

    #[test]
    fn order_changes_the_checksum() {
        assert_ne!(
            header_checksum(&headers(&["a", "b"])),
            header_checksum(&headers(&["b", "a"]))
        );
        assert_eq!(header_checksum(&headers(&["b", "a"])), "17f47");
    }

    #[test]
    fn negative_hashes_keep_their_sign() {
        assert_eq!(
            header_checksum(&headers(&["h1", "h2", "chkA", "chkB"])),
            "-17705102"
        );
        assert_eq!(
            header_checksum(&headers(&["h1", "h2", "h3", "chkA", "chkB"])),
            "-123f01d5"
        );
    }

    #[test]
    fn non_ascii_headers_fold_over_utf16_units() {
        assert_eq!(header_checksum(&headers(&["café", "naïve"])), "96f4bb0");
    }

    #[test]
    fn added_column_changes_the_checksum() {
        assert_ne!(
            header_checksum(&headers(&["h1", "h2", "chkA", "chkB"])),
            header_checksum(&headers(&["h1", "h2", "h3", "chkA", "chkB"]))
        );
    }
}
