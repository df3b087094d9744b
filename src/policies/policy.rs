//! # Concurrency policy tags.
//!
//! [`ConcurrencyPolicy`] is the declarative tag attached to a handler. It is a
//! closed set plus one escape hatch: tags that come from outside the type system
//! (configuration, generated declarations) and are not recognized are kept as
//! [`ConcurrencyPolicy::Unrecognized`] and later resolved to `every`.
//!
//! - [`ConcurrencyPolicy::Every`] every matching action starts a new invocation (default).
//! - [`ConcurrencyPolicy::Latest`] a new invocation cancels the previous one.
//! - [`ConcurrencyPolicy::Leading`] matching actions are ignored while one is in flight.
//! - [`ConcurrencyPolicy::Throttle`] at most one start per window.
//!
//! ## Parsing
//! ```rust
//! use takevisor::ConcurrencyPolicy;
//!
//! assert_eq!("latest".parse::<ConcurrencyPolicy>().unwrap(), ConcurrencyPolicy::Latest);
//! assert_eq!("takeLeading".parse::<ConcurrencyPolicy>().unwrap(), ConcurrencyPolicy::Leading);
//! assert_eq!("TAKE_EVERY".parse::<ConcurrencyPolicy>().unwrap(), ConcurrencyPolicy::Every);
//! assert!(matches!(
//!     "debounce".parse::<ConcurrencyPolicy>().unwrap(),
//!     ConcurrencyPolicy::Unrecognized(_)
//! ));
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Declared dispatch policy for one handler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ConcurrencyPolicy {
    /// Start a new concurrent invocation for every matching action.
    #[default]
    Every,
    /// Cancel the in-flight invocation and start a new one (newest wins).
    Latest,
    /// Ignore matching actions while an invocation is in flight.
    Leading,
    /// Start on the first matching action, then ignore matches for the window.
    Throttle,
    /// Tag that does not name a known policy; resolves to [`ConcurrencyPolicy::Every`].
    Unrecognized(Arc<str>),
}

impl ConcurrencyPolicy {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &str {
        match self {
            ConcurrencyPolicy::Every => "every",
            ConcurrencyPolicy::Latest => "latest",
            ConcurrencyPolicy::Leading => "leading",
            ConcurrencyPolicy::Throttle => "throttle",
            ConcurrencyPolicy::Unrecognized(tag) => tag,
        }
    }

    /// Builds a policy from an optional tag; `None` means "absent".
    ///
    /// Absent tags are treated as an empty unrecognized tag so the resolver can
    /// report the fallback the same way it does for unknown ones.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some(tag) => tag.parse().unwrap_or_default(),
            None => ConcurrencyPolicy::Unrecognized(Arc::from("")),
        }
    }
}

impl FromStr for ConcurrencyPolicy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let normalized = normalized.strip_prefix("take").unwrap_or(normalized.as_str());

        Ok(match normalized {
            "every" => ConcurrencyPolicy::Every,
            "latest" => ConcurrencyPolicy::Latest,
            "leading" => ConcurrencyPolicy::Leading,
            "throttle" => ConcurrencyPolicy::Throttle,
            _ => ConcurrencyPolicy::Unrecognized(Arc::from(s)),
        })
    }
}

impl fmt::Display for ConcurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_spellings() {
        for (tag, want) in [
            ("every", ConcurrencyPolicy::Every),
            ("take-latest", ConcurrencyPolicy::Latest),
            ("Leading", ConcurrencyPolicy::Leading),
            ("THROTTLE", ConcurrencyPolicy::Throttle),
        ] {
            assert_eq!(tag.parse::<ConcurrencyPolicy>().unwrap(), want, "tag={tag}");
        }
    }

    #[test]
    fn unknown_keeps_original_tag() {
        let p: ConcurrencyPolicy = "take_debounce".parse().unwrap();
        assert_eq!(p, ConcurrencyPolicy::Unrecognized(Arc::from("take_debounce")));
        assert_eq!(p.to_string(), "take_debounce");
    }

    #[test]
    fn absent_tag_is_unrecognized() {
        assert_eq!(
            ConcurrencyPolicy::from_tag(None),
            ConcurrencyPolicy::Unrecognized(Arc::from(""))
        );
        assert_eq!(
            ConcurrencyPolicy::from_tag(Some("latest")),
            ConcurrencyPolicy::Latest
        );
    }
}
