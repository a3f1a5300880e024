//! `${VAR}` and `${VAR:-default}` expansion in configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Variable referenced by a config value but absent from the environment.
struct UnsetVar(String);

/// Expand `${VAR}` references in the value of `field`.
///
/// Only the braced form is recognized; strings without `${` are returned
/// untouched, so a bare `$` in a path or URL survives.
pub(crate) fn expand_env<'a>(value: &'a str, field: &str) -> Result<Cow<'a, str>, ConfigError> {
    if !value.contains("${") {
        return Ok(Cow::Borrowed(value));
    }

    shellexpand::env_with_context(value, |var| {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map_err(|err| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", err.cause.0),
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(current) = value.as_deref() {
        let expanded = expand_env(current, field)?.into_owned();
        *value = Some(expanded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expand_with_default() {
        // SAFETY: the variable is unique to this test
        unsafe {
            std::env::remove_var("DOCMARK_TEST_UNSET_LANG");
        }
        let value = expand_env("${DOCMARK_TEST_UNSET_LANG:-en}", "page.language").unwrap();
        assert_eq!(value, "en");
    }

    #[test]
    fn test_expand_set_var() {
        // SAFETY: the variable is unique to this test
        unsafe {
            std::env::set_var("DOCMARK_TEST_PACKAGE", "diffusers");
        }
        let value = expand_env("${DOCMARK_TEST_PACKAGE}", "page.package_name").unwrap();
        assert_eq!(value, "diffusers");
        unsafe {
            std::env::remove_var("DOCMARK_TEST_PACKAGE");
        }
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: the variable is unique to this test
        unsafe {
            std::env::remove_var("DOCMARK_TEST_MISSING");
        }
        let err = expand_env("kit/${DOCMARK_TEST_MISSING}/lib", "components.source_dir").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Environment variable error in components.source_dir: ${DOCMARK_TEST_MISSING} not set"
        );
    }

    #[test]
    fn test_literal_is_borrowed() {
        assert!(matches!(expand_env("$HOME/docs", "x").unwrap(), Cow::Borrowed("$HOME/docs")));
    }

    #[test]
    fn test_expand_opt() {
        let mut value = None;
        expand_opt(&mut value, "page.version").unwrap();
        assert_eq!(value, None);

        let mut value = Some("v${DOCMARK_TEST_UNSET_MAJOR:-4}".to_owned());
        expand_opt(&mut value, "page.version").unwrap();
        assert_eq!(value.as_deref(), Some("v4"));
    }
}
