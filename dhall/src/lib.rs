//! Public façade: parses source text and normalizes the result, wiring
//! together `dhall_syntax` and `dhall_normalize` behind a single crate name.

pub use dhall_normalize::{
    is_normalized, is_normalized_with, normalize, normalize_with, NormalizationRules,
};
pub use dhall_syntax::{
    alpha_equivalent, alpha_normalize, fmt_expr, free_in, noapp, rename, review, shift,
    shift_subst_shift, subst, view, Builtin, Const, Expr, InterpolatedText, Label, NaiveDouble,
    RawExpr, RecordMap, Spine, UnionMap, V,
};

use std::fmt;

/// Everything that can go wrong calling into this crate. `Resolve` and
/// `Typecheck` variants belong here once import resolution and the type
/// checker are implemented; for now the only failure mode is a parse error.
#[derive(Debug)]
pub enum Error {
    Parse(dhall_syntax::ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
        }
    }
}

impl From<dhall_syntax::ParseError> for Error {
    fn from(e: dhall_syntax::ParseError) -> Self {
        Error::Parse(e)
    }
}

/// Parses `input` and returns its normal form.
pub fn parse_and_normalize(input: &str) -> Result<Expr, Error> {
    log::trace!("parsing {} bytes of source", input.len());
    let parsed = dhall_syntax::parse_expr(input)?;
    log::debug!("parsed expression, normalizing");
    Ok(normalize(&parsed))
}

/// Parses `input`, without normalizing it.
pub fn parse_expr(input: &str) -> Result<Expr, Error> {
    log::trace!("parsing {} bytes of source", input.len());
    Ok(dhall_syntax::parse_expr(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_normalize_beta_reduces() {
        let result = parse_and_normalize("(\\(x : Natural) -> x + 1) 2").unwrap();
        assert_eq!(result, dhall_syntax::parse_expr("3").unwrap());
        assert_eq!(result.to_string(), "3");
    }

    #[test]
    fn parse_error_reports_through_facade() {
        let err = parse_expr("(").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn judgmental_equivalence_is_congruence_only() {
        let e = parse_and_normalize("1 + 1 === 2").unwrap();
        assert!(matches!(e.as_raw(), RawExpr::Equivalence(..)));
    }
}
