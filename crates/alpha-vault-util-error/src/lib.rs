//! Error helpers shared by all Alpha Vault crates.
//!
//! Mostly about rendering whole error chains on a single log line, so
//! `warn!(err = %err.fmt_compact(), ...)` shows the root cause too.

use std::{error, fmt, result};

pub type WhateverResult<T> = result::Result<T, snafu::Whatever>;

/// Renders `err: source: source-of-source` on one line
pub struct FmtCompactError<'e, E>(pub &'e E);

impl<E> fmt::Display for FmtCompactError<'_, E>
where
    E: error::Error,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut next = Some(self.0 as &dyn error::Error);
        let mut first = true;

        while let Some(err) = next {
            if !first {
                f.write_str(": ")?;
            }
            first = false;
            write!(f, "{err}")?;
            next = err.source();
        }

        Ok(())
    }
}

pub trait FmtCompact {
    type Report: fmt::Display;
    fn fmt_compact(self) -> Self::Report;
}

impl<'e, E> FmtCompact for &'e E
where
    E: error::Error,
{
    type Report = FmtCompactError<'e, E>;

    fn fmt_compact(self) -> Self::Report {
        FmtCompactError(self)
    }
}

#[cfg(test)]
mod tests {
    use snafu::Snafu;

    use super::FmtCompact as _;

    #[derive(Debug, Snafu)]
    #[snafu(display("disk on fire"))]
    struct Inner;

    #[derive(Debug, Snafu)]
    #[snafu(display("could not save session"))]
    struct Outer {
        source: Inner,
    }

    #[test]
    fn compact_format_walks_the_chain() {
        let err = Outer { source: Inner };
        assert_eq!(
            err.fmt_compact().to_string(),
            "could not save session: disk on fire"
        );
    }
}
