use regex::Regex;
use snafu::ResultExt;

use super::{Config, Error, Garden, error};

/// Names of the capture groups a pattern may use.
pub const CAPTURE_GROUPS: [&str; 4] = ["garden", "project", "namespace", "shoot"];

/// Outcome of matching a value against the configured patterns.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PatternMatch {
    /// Canonical name of the garden whose pattern matched.
    pub garden: String,
    pub project: Option<String>,
    pub namespace: Option<String>,
    pub shoot: Option<String>,
}

/// Compiles `pattern` and rejects capture groups outside [`CAPTURE_GROUPS`].
pub(super) fn compile(garden: &str, pattern: &str) -> Result<Regex, Error> {
    let regex = Regex::new(pattern).with_context(|_| error::InvalidPatternSnafu {
        garden: garden.to_string(),
        pattern: pattern.to_string(),
    })?;

    if let Some(group) =
        regex.capture_names().flatten().find(|name| !CAPTURE_GROUPS.contains(name))
    {
        return error::UnsupportedCaptureGroupSnafu {
            garden: garden.to_string(),
            pattern: pattern.to_string(),
            group: group.to_string(),
        }
        .fail();
    }

    Ok(regex)
}

impl Garden {
    /// Returns the captures of the first of this garden's patterns matching
    /// `value`.
    ///
    /// A pattern capturing a `garden` group only counts when the captured
    /// text names this garden.
    ///
    /// # Errors
    ///
    /// Fails if one of the patterns does not compile.
    pub fn match_pattern(&self, value: &str) -> Result<Option<PatternMatch>, Error> {
        for pattern in &self.patterns {
            let regex = compile(&self.name, pattern)?;
            let Some(captures) = regex.captures(value) else {
                continue;
            };

            let group = |name: &str| {
                captures
                    .name(name)
                    .map(|m| m.as_str().to_string())
                    .filter(|value| !value.is_empty())
            };

            if let Some(garden) = group("garden")
                && !self.is_named(&garden)
            {
                tracing::debug!(
                    "Pattern '{pattern}' captured garden '{garden}' which is not '{}'",
                    self.name
                );
                continue;
            }

            return Ok(Some(PatternMatch {
                garden: self.name.clone(),
                project: group("project"),
                namespace: group("namespace"),
                shoot: group("shoot"),
            }));
        }

        Ok(None)
    }
}

impl Config {
    /// Matches `value` against the configured patterns.
    ///
    /// The patterns of `current_garden` are tried first. If none of them
    /// match, every garden is tried and exactly one garden must match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPatternMatch`] if nothing matches and
    /// [`Error::AmbiguousPattern`] if patterns of several gardens match.
    pub fn match_pattern(
        &self,
        value: &str,
        current_garden: Option<&str>,
    ) -> Result<PatternMatch, Error> {
        if let Some(garden) = current_garden.and_then(|name| self.find_garden(name).ok())
            && let Some(found) = garden.match_pattern(value)?
        {
            return Ok(found);
        }

        let mut matches = Vec::new();
        for garden in &self.gardens {
            if let Some(found) = garden.match_pattern(value)? {
                matches.push(found);
            }
        }

        match matches.len() {
            0 => error::NoPatternMatchSnafu { value: value.to_string() }.fail(),
            1 => Ok(matches.remove(0)),
            _ => error::AmbiguousPatternSnafu {
                value: value.to_string(),
                gardens: matches.into_iter().map(|found| found.garden).collect::<Vec<_>>(),
            }
            .fail(),
        }
    }
}
