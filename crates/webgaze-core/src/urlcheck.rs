/// Returns true only for absolute `http`/`https` URLs.
///
/// No network access and no normalization; a parse failure or any other
/// scheme is false.
pub fn is_valid_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/path?q=1"));
        assert!(is_valid_url("HTTPS://EXAMPLE.COM"));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(!is_valid_url("ftp://x"));
        assert!(!is_valid_url("file:///etc/passwd"));
        assert!(!is_valid_url("javascript:alert(1)"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("//example.com"));
        assert!(!is_valid_url("http//missing-colon.com"));
    }

    proptest! {
        #[test]
        fn strings_without_a_scheme_separator_are_rejected(s in "[^:]*") {
            prop_assert!(!is_valid_url(&s));
        }

        #[test]
        fn non_http_schemes_are_rejected(scheme in "[a-z][a-z0-9]{1,8}") {
            prop_assume!(scheme != "http" && scheme != "https");
            let candidate = format!("{scheme}://example.com/");
            prop_assert!(!is_valid_url(&candidate));
        }

        #[test]
        fn http_hosts_are_accepted(host in "[a-z]{1,12}\\.(com|org|net)") {
            let http_url = format!("http://{}/", host);
            let https_url = format!("https://{}/", host);
            prop_assert!(is_valid_url(&http_url));
            prop_assert!(is_valid_url(&https_url));
        }
    }
}
