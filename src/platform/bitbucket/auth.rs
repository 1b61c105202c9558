use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Build the `Authorization` header value for HTTP Basic authentication.
pub fn basic_auth_header(user: &str, token: &str) -> String {
    let encoded = STANDARD.encode(format!("{user}:{token}"));
    format!("Basic {encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        // base64("Aladdin:open sesame")
        assert_eq!(
            basic_auth_header("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_basic_auth_header_keeps_colons_in_token() {
        let header = basic_auth_header("bot", "a:b");
        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, b"bot:a:b");
    }
}
