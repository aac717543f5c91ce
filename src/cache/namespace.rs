//! Key namespacing shared by all backends.

use std::borrow::Cow;

use super::errors::{CacheError, CacheResult};

/// Ends every namespace prefix. Namespace names may not contain it.
pub const SEPARATOR: char = ':';

/// Private key prefix of one backend instance.
///
/// Stored keys are `name + ':' + key`. Names are non-empty and never contain
/// the separator, so the prefix of one namespace can never be the start of
/// another's: `pages:` and `pages2:` stay disjoint. Stripping rejects keys
/// that don't carry the prefix, which keeps foreign entries in a shared store
/// out of [`Cache::entries`](super::Cache::entries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: Cow<'static, str>,
}

impl Namespace {
    /// Create a namespace.
    ///
    /// Fails if `name` is blank or contains the `:` separator.
    pub fn new(name: impl Into<Cow<'static, str>>) -> CacheResult<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(CacheError::InvalidArgument {
                name: "namespace",
                reason: "must not be empty or whitespace".to_string(),
            });
        }

        if name.contains(SEPARATOR) {
            return Err(CacheError::InvalidArgument {
                name: "namespace",
                reason: format!("`{name}` must not contain `{SEPARATOR}`"),
            });
        }

        Ok(Self { name })
    }

    // Built-in names are known to be valid.
    pub(crate) const fn builtin(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
        }
    }

    /// The namespace name, without separator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prepend the prefix to a caller key.
    pub fn qualify(&self, key: &str) -> String {
        let mut qualified = String::with_capacity(self.name.len() + 1 + key.len());
        qualified.push_str(&self.name);
        qualified.push(SEPARATOR);
        qualified.push_str(key);
        qualified
    }

    /// Strip the prefix from a stored key.
    ///
    /// Returns `None` for keys that belong to someone else.
    pub fn strip<'k>(&self, stored: &'k str) -> Option<&'k str> {
        stored
            .strip_prefix(self.name.as_ref())?
            .strip_prefix(SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_and_strip() {
        let ns = Namespace::new("static-cache").unwrap();
        let stored = ns.qualify("user:1");

        assert_eq!(stored, "static-cache:user:1");
        assert_eq!(ns.strip(&stored), Some("user:1"));
    }

    #[test]
    fn test_foreign_keys_are_invisible() {
        let ns = Namespace::new("static-cache").unwrap();
        assert_eq!(ns.strip("session:abc"), None);
        assert_eq!(ns.strip("request-cache:user:1"), None);
        assert_eq!(ns.strip("static-cache"), None);
    }

    #[test]
    fn test_overlapping_names_stay_disjoint() {
        let pages = Namespace::new("pages").unwrap();
        let pages2 = Namespace::new("pages2").unwrap();

        assert_eq!(pages.strip(&pages2.qualify("home")), None);
        assert_eq!(pages2.strip(&pages.qualify("2home")), None);
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(matches!(
            Namespace::new(""),
            Err(CacheError::InvalidArgument { name: "namespace", .. })
        ));
        assert!(Namespace::new("  ").is_err());
        assert!(Namespace::new("pages:").is_err());
        assert!(Namespace::new("pages:archive").is_err());
    }

    #[test]
    fn test_builtin_matches_validated() {
        assert_eq!(
            Namespace::builtin("request-cache"),
            Namespace::new("request-cache").unwrap()
        );
    }
}
