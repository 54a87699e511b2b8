use std::fmt;

use crate::errors::DomainError;

/// Upper bound on prefixes per filter. Each prefix is one bound SQL
/// parameter and SQLite refuses statements with more than 32766.
pub const MAX_PREFIXES: usize = 32_766;

/// Splits a comma-separated list into trimmed segments. Blank segments are
/// kept so that validation can report their position.
pub fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',').map(|segment| segment.trim().to_string()).collect()
}

/// An ordered, non-empty list of trimmed, non-empty `first_name` prefixes.
///
/// A `PrefixFilter` can only be built through [`PrefixFilter::new`] or
/// [`PrefixFilter::parse`], so holding one means the input was already
/// validated. There is no "match everything" filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixFilter {
    prefixes: Vec<String>,
}

impl PrefixFilter {
    pub fn new<I, S>(segments: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = segments
            .into_iter()
            .enumerate()
            .map(|(position, segment)| {
                let trimmed = segment.as_ref().trim();
                if trimmed.is_empty() {
                    Err(DomainError::BlankPrefix { position })
                } else {
                    Ok(trimmed.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if prefixes.is_empty() {
            return Err(DomainError::EmptyPrefixFilter);
        }
        if prefixes.len() > MAX_PREFIXES {
            return Err(DomainError::TooManyPrefixes { count: prefixes.len(), max: MAX_PREFIXES });
        }

        Ok(Self { prefixes })
    }

    /// Splits a raw comma-separated list, e.g. the `prefix` query parameter.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::EmptyPrefixFilter);
        }
        Self::new(split_prefixes(raw))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }
}

impl fmt::Display for PrefixFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefixes.join(","))
    }
}
