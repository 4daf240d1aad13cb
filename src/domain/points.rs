/// Accounts are identified by a plain integer id.
pub type AccountId = i64;

/// Points are whole units; there is no fractional part.
pub type Points = i64;

/// Highest balance an account may hold unless configured otherwise.
pub const DEFAULT_MAX_BALANCE: Points = 100_000;

/// Parse a point amount given on the command line.
/// Accepts an optional sign and `_` or `,` digit separators ("10_000", "1,500").
pub fn parse_points(input: &str) -> Result<Points, ParsePointsError> {
    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != '_' && *c != ',')
        .collect();

    if cleaned.is_empty() {
        return Err(ParsePointsError::Empty);
    }

    cleaned
        .parse::<Points>()
        .map_err(|_| ParsePointsError::InvalidFormat(input.trim().to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParsePointsError {
    #[error("empty point amount")]
    Empty,

    #[error("invalid point amount: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        assert_eq!(parse_points("500"), Ok(500));
        assert_eq!(parse_points(" 10_000 "), Ok(10_000));
        assert_eq!(parse_points("1,500"), Ok(1_500));
        assert_eq!(parse_points("-20"), Ok(-20));
        assert_eq!(parse_points("0"), Ok(0));
    }

    #[test]
    fn test_parse_points_invalid() {
        assert_eq!(parse_points(""), Err(ParsePointsError::Empty));
        assert!(matches!(
            parse_points("12.5"),
            Err(ParsePointsError::InvalidFormat(_))
        ));
        assert!(parse_points("abc").is_err());
    }
}
