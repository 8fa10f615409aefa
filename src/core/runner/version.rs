use crate::core::error::{BootstrapError, BootstrapResult};
use crate::core::settings::GlobalSettings;

/// Decides whether the installed runtime satisfies the configured target
/// version expression.
///
/// A target expression is a comma/whitespace-separated list of clauses, each
/// `major.minor[.micro[_release]][+]`. The installed version matches when any
/// clause accepts it:
///
/// - major must be equal, minor must be at least the clause's minor;
/// - a trailing `+` makes that floor the whole requirement;
/// - without `+`, micro and release must be equal where the clause states
///   them. A clause that states a field the installed version lacks does not
///   match; a field the clause omits is unconstrained.
///
/// Components compare numerically, so `1.10` satisfies `1.9+`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionMatcher;

impl VersionMatcher {
    pub fn matches(&self, settings: &GlobalSettings) -> BootstrapResult<bool> {
        let target = settings.target_runtime_version().trim();
        if target.is_empty() {
            return Ok(false);
        }

        let current_raw = settings.current_runtime_version().trim();
        if current_raw.is_empty() {
            return Err(BootstrapError::Configuration(
                "current runtime version is not defined".into(),
            ));
        }
        let current = Version::parse(current_raw)?;

        for clause in target.split(|ch: char| ch == ',' || ch.is_whitespace()) {
            if clause.is_empty() {
                continue;
            }
            if current.satisfies(&Version::parse(clause)?) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Version {
    major: u32,
    minor: u32,
    micro: Option<u32>,
    release: Option<u32>,
    /// Trailing `+`: everything at or above this version is acceptable.
    minimum: bool,
}

impl Version {
    fn parse(raw: &str) -> BootstrapResult<Self> {
        let raw = raw.trim();
        let (core, minimum) = match raw.strip_suffix('+') {
            Some(stripped) => (stripped, true),
            None => (raw, false),
        };

        let (dotted, release) = match core.split_once('_') {
            Some((dotted, release)) => (dotted, Some(parse_component(raw, release)?)),
            None => (core, None),
        };

        let mut parts = dotted.split('.');
        let major = match parts.next() {
            Some(part) if !part.is_empty() => parse_component(raw, part)?,
            _ => return Err(unparsable(raw)),
        };
        let minor = match parts.next() {
            Some(part) => parse_component(raw, part)?,
            None => return Err(unparsable(raw)),
        };
        let micro = parts.next().map(|part| parse_component(raw, part)).transpose()?;
        if parts.next().is_some() {
            return Err(unparsable(raw));
        }
        // A release qualifier extends a micro; `1.4_04` is not a version.
        if release.is_some() && micro.is_none() {
            return Err(unparsable(raw));
        }

        Ok(Self {
            major,
            minor,
            micro,
            release,
            minimum,
        })
    }

    fn satisfies(&self, target: &Version) -> bool {
        if self.major != target.major {
            return false;
        }
        if self.minor < target.minor {
            return false;
        }
        if target.minimum {
            return true;
        }
        field_matches(self.micro, target.micro) && field_matches(self.release, target.release)
    }
}

/// Exact match where the target states the field; a stated target field with
/// nothing to compare against on the current side is a mismatch.
fn field_matches(current: Option<u32>, target: Option<u32>) -> bool {
    match (current, target) {
        (Some(current), Some(target)) => current == target,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

fn parse_component(version: &str, part: &str) -> BootstrapResult<u32> {
    part.parse()
        .map_err(|_| unparsable(version))
}

fn unparsable(raw: &str) -> BootstrapError {
    BootstrapError::Configuration(format!("cannot parse runtime version '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::settings::test_support::SettingsBuilder;

    fn matches(current: &str, target: &str) -> BootstrapResult<bool> {
        let settings = SettingsBuilder::new()
            .current_version(current)
            .target_version(target)
            .build();
        VersionMatcher.matches(&settings)
    }

    #[test]
    fn exact_version_with_release_matches_itself() {
        assert!(matches("1.4.2_04", "1.4.2_04").unwrap());
    }

    #[test]
    fn stated_release_is_required() {
        assert!(!matches("1.4.2", "1.4.2_04").unwrap());
        assert!(matches("1.4.2_04", "1.4.2").unwrap());
    }

    #[test]
    fn plus_accepts_anything_at_or_above_the_floor() {
        assert!(matches("1.5.0_17", "1.4+").unwrap());
        assert!(matches("1.4.0", "1.4+").unwrap());
        assert!(!matches("1.4", "1.5+").unwrap());
        assert!(!matches("2.0", "1.4+").unwrap());
    }

    #[test]
    fn minor_components_compare_numerically() {
        assert!(matches("1.10", "1.9+").unwrap());
    }

    #[test]
    fn any_clause_in_a_list_may_match() {
        assert!(matches("1.4.2", "1.5, 1.4.2").unwrap());
        assert!(matches("1.5.0", "1.5 1.4.2").unwrap());
        assert!(!matches("1.3.1", "1.5, 1.4.2").unwrap());
    }

    #[test]
    fn blank_target_never_matches() {
        assert!(!matches("1.8.0", "").unwrap());
        assert!(!matches("1.8.0", "   ").unwrap());
    }

    #[test]
    fn blank_current_version_is_a_configuration_error() {
        assert!(matches!(
            matches("", "1.8.0").unwrap_err(),
            BootstrapError::Configuration(_)
        ));
    }

    #[test]
    fn garbage_versions_are_configuration_errors() {
        assert!(matches("1.8.x", "1.8").is_err());
        assert!(matches("1.8", "one.eight").is_err());
        assert!(matches("1.2.3.4", "1.2").is_err());
    }

    #[test]
    fn versions_outside_the_grammar_are_rejected() {
        // Major alone and a release without a micro are not versions.
        assert!(matches("8", "1.8").is_err());
        assert!(matches("1.8.0", "8+").is_err());
        assert!(matches("1.4_04", "1.4").is_err());
        assert!(matches("1.4.2", "1.4_04").is_err());
    }
}
