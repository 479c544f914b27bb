/// Get an environment variable with the `AGEVERIFY_` prefix, falling back to the bare name
///
/// `AGEVERIFY_PORT` wins over `PORT`, which keeps the service deployable on
/// platforms that inject unprefixed variables.
///
/// # Examples
///
/// ```rust
/// use ageverify::utils::get_env_with_prefix;
///
/// // Checks AGEVERIFY_WEBHOOK_SHARED_SECRET first, then WEBHOOK_SHARED_SECRET
/// let secret = get_env_with_prefix("WEBHOOK_SHARED_SECRET");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("AGEVERIFY_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("AGEVERIFY_ENV_TEST_VAR", "prefixed_value");
            std::env::set_var("ENV_TEST_VAR", "unprefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("ENV_TEST_VAR"),
            Some("prefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("AGEVERIFY_ENV_TEST_VAR");
        }

        assert_eq!(
            get_env_with_prefix("ENV_TEST_VAR"),
            Some("unprefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("ENV_TEST_VAR");
        }

        assert_eq!(get_env_with_prefix("ENV_TEST_MISSING_VAR"), None);
    }
}
