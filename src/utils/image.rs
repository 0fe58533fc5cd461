use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes a camera capture submitted either as a bare base64 string or as
/// a `data:image/jpeg;base64,...` data URL.
pub fn decode_image_payload(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let raw = match data.split_once(',') {
        Some((_, b64)) => b64,
        None => data,
    };
    STANDARD.decode(raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_base64() {
        assert_eq!(decode_image_payload("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn strips_data_url_prefix() {
        let payload = "data:image/jpeg;base64,aGVsbG8=";
        assert_eq!(decode_image_payload(payload).unwrap(), b"hello");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_image_payload("data:image/jpeg;base64,!!!").is_err());
    }
}
