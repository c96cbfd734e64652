//! Date parsing errors

/// Why a string could not be read as a calendar date.
///
/// Callers in the parsing pipeline never surface these; they collapse into
/// `false` (classification) or a null `Date2` (reconciliation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    /// No year, month, day or time component was found.
    NoDate,
    /// A token that is neither date-like nor skippable (strict mode only).
    UnknownToken(String),
    /// More than three year/month/day candidates.
    TooManyValues,
    /// A second year or a second month name.
    Duplicate(&'static str),
    /// Numeric value doesn't fit the field it resolved to.
    OutOfRange { field: &'static str, value: i64 },
    /// A digit run too long to be any date component.
    Overflow(String),
}

impl std::fmt::Display for DateParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDate => write!(f, "string does not contain a date"),
            Self::UnknownToken(t) => write!(f, "unknown token: {t:?}"),
            Self::TooManyValues => write!(f, "more than three year/month/day values"),
            Self::Duplicate(what) => write!(f, "{what} is already set"),
            Self::OutOfRange { field, value } => write!(f, "{field} out of range: {value}"),
            Self::Overflow(t) => write!(f, "numeric token too large: {t}"),
        }
    }
}

impl std::error::Error for DateParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_out_of_range() {
        let err = DateParseError::OutOfRange {
            field: "month",
            value: 13,
        };
        assert_eq!(err.to_string(), "month out of range: 13");
    }

    #[test]
    fn display_unknown_token_is_quoted() {
        let err = DateParseError::UnknownToken("Author".into());
        assert!(err.to_string().contains("\"Author\""));
    }
}
