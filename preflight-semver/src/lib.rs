use semver::VersionReq;
use std::error::Error as StdError;
use std::fmt;

/// An npm-style version requirement: one or more `||`-separated
/// alternatives, loose whitespace between comparators, and an empty
/// string meaning "any version".
#[derive(Debug, Clone)]
pub struct RangeSet {
    source: String,
    alternatives: Vec<VersionReq>,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    input: String,
    message: String,
}

impl ParseError {
    pub fn new(input: String, message: String) -> Self {
        Self { input, message }
    }

    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.input)
    }
}

impl StdError for ParseError {}

impl RangeSet {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut s = source.trim();

        if s.is_empty() {
            s = "*";
        }

        let mut alternatives = Vec::new();

        for part in s.split("||") {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let normalized = normalize_comparators(part);

            let req = VersionReq::parse(&normalized)
                .map_err(|err| ParseError::new(source.to_string(), err.to_string()))?;

            alternatives.push(req);
        }

        if alternatives.is_empty() {
            let req = VersionReq::parse("*")
                .map_err(|err| ParseError::new(source.to_string(), err.to_string()))?;
            alternatives.push(req);
        }

        Ok(RangeSet {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|r| r.matches(version))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Pick the highest version string satisfying this set, per semver
    /// precedence. Strings that do not parse as versions are skipped.
    pub fn max_satisfying<'a, I>(&self, versions: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<(Version, &'a str)> = None;

        for candidate in versions {
            let Ok(version) = Version::parse(candidate) else {
                continue;
            };

            if !self.matches(&version) {
                continue;
            }

            match &best {
                Some((current, _)) if version <= *current => {}
                _ => best = Some((version, candidate)),
            }
        }

        best.map(|(_, candidate)| candidate)
    }
}

/// Semver comparators inside one `||` alternative are separated by
/// whitespace in npm ranges; the semver crate wants commas except after a
/// dangling operator token.
fn normalize_comparators(part: &str) -> String {
    let tokens: Vec<&str> = part.split_whitespace().collect();

    if tokens.len() <= 1 {
        return part.to_string();
    }

    if tokens.len() == 3 && tokens[1] == "-" {
        return part.to_string();
    }

    let mut result = String::new();

    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            let prev = tokens[i - 1];
            if matches!(prev, "=" | ">" | ">=" | "<" | "<=" | "~" | "^") {
                result.push(' ');
            } else {
                result.push_str(", ");
            }
        }

        result.push_str(token);
    }
    result
}

pub use semver::Version;

#[cfg(test)]
mod tests {
    use super::*;
    use semver::VersionReq;

    #[test]
    fn normalizes_ge_space() {
        let input = ">= 4.21.0";
        let normalized = normalize_comparators(input);
        let req = VersionReq::parse(&normalized);
        assert!(
            req.is_ok(),
            "Failed to parse normalized '{}' -> '{}': {:?}",
            input,
            normalized,
            req.err()
        );
    }

    #[test]
    fn parses_simple_range() {
        let set = RangeSet::parse(">= 4.21.0").unwrap();
        let v = Version::parse("4.21.0").unwrap();
        assert!(set.matches(&v));
    }

    #[test]
    fn treats_empty_as_wildcard() {
        let set = RangeSet::parse("").unwrap();
        let v = Version::parse("999.0.0").unwrap();
        assert!(set.matches(&v));
    }

    #[test]
    fn handles_or_ranges() {
        let set = RangeSet::parse("^1.0.0 || ^2.0.0").unwrap();
        let v1 = Version::parse("1.5.0").unwrap();
        let v2 = Version::parse("2.3.0").unwrap();
        let v3 = Version::parse("3.0.0").unwrap();
        assert!(set.matches(&v1));
        assert!(set.matches(&v2));
        assert!(!set.matches(&v3));
    }

    #[test]
    fn max_satisfying_picks_highest() {
        let set = RangeSet::parse("^1.3.0").unwrap();
        let versions = ["1.2.9", "1.3.0", "1.4.1", "2.0.0"];
        assert_eq!(set.max_satisfying(versions), Some("1.4.1"));
    }

    #[test]
    fn max_satisfying_none_when_nothing_matches() {
        let set = RangeSet::parse("^3.0.0").unwrap();
        let versions = ["1.0.0", "2.0.0"];
        assert_eq!(set.max_satisfying(versions), None);
    }

    #[test]
    fn max_satisfying_skips_unparsable_versions() {
        let set = RangeSet::parse("*").unwrap();
        let versions = ["not-a-version", "0.9.0"];
        assert_eq!(set.max_satisfying(versions), Some("0.9.0"));
    }

    #[test]
    fn max_satisfying_spans_or_alternatives() {
        let set = RangeSet::parse("^1.0.0 || ^2.0.0").unwrap();
        let versions = ["1.9.0", "2.1.0", "3.0.0"];
        assert_eq!(set.max_satisfying(versions), Some("2.1.0"));
    }
}
