//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// `${VAR}` fails with [`ConfigError::EnvVar`] naming `field` when `VAR` is
/// unset; `${VAR:-default}` falls back to `default`. Only braced references are
/// expanded. Bare `$VAR` text is copied verbatim even next to a braced
/// reference, so Redis passwords and URL paths containing `$` survive.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        expanded.push_str(&rest[..start]);
        expanded.push_str(&expand_reference(&rest[start..=start + len], field)?);
        rest = &rest[start + len + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Expand a single `${...}` reference.
fn expand_reference(reference: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env_with_context(reference, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a variable that was referenced but not set.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("QUIRE_TEST_REDIS_HOST", "cache.internal");
        }
        let result = expand_env("redis://${QUIRE_TEST_REDIS_HOST}/0", "cache.url").unwrap();
        assert_eq!(result, "redis://cache.internal/0");
        unsafe {
            std::env::remove_var("QUIRE_TEST_REDIS_HOST");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("QUIRE_TEST_UNSET_ENV");
        }
        let result = expand_env("${QUIRE_TEST_UNSET_ENV:-dev}", "app.env").unwrap();
        assert_eq!(result, "dev");
    }

    #[test]
    fn test_expand_value_wins_over_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("QUIRE_TEST_APP_ENV", "production");
        }
        let result = expand_env("${QUIRE_TEST_APP_ENV:-dev}", "app.env").unwrap();
        assert_eq!(result, "production");
        unsafe {
            std::env::remove_var("QUIRE_TEST_APP_ENV");
        }
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("QUIRE_TEST_MISSING");
        }
        let err = expand_env("${QUIRE_TEST_MISSING}", "cache.url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in cache.url: ${QUIRE_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("redis://:pa$$word@host/", "cache.url").unwrap();
        assert_eq!(result, "redis://:pa$$word@host/");
    }

    #[test]
    fn test_bare_dollar_kept_next_to_braced_reference() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("QUIRE_TEST_MIXED_HOST", "cache.internal");
        }
        let result = expand_env("redis://:pa$word@${QUIRE_TEST_MIXED_HOST}/", "cache.url").unwrap();
        assert_eq!(result, "redis://:pa$word@cache.internal/");
        unsafe {
            std::env::remove_var("QUIRE_TEST_MIXED_HOST");
        }
    }

    #[test]
    fn test_unterminated_reference_is_kept() {
        let result = expand_env("redis://${HOST/", "cache.url").unwrap();
        assert_eq!(result, "redis://${HOST/");
    }
}
