//! Assertion helpers for authorization outcomes.

/// Assert that a catalog or authorization error is an access denial.
#[macro_export]
macro_rules! assert_denied {
    ($err:expr) => {
        assert!(
            $crate::assertions::is_denied(&$err),
            "expected access denied, got: {}",
            $err
        )
    };
}

/// Assert the number of denial records written for `actor`.
#[macro_export]
macro_rules! assert_denials {
    ($sink:expr, $actor:expr, $expected:expr) => {{
        let found = $sink
            .query(
                &$crate::__audit::AuditFilter::new()
                    .actor($actor)
                    .kind($crate::__audit::AuditKind::Denial),
            )
            .len();
        assert_eq!(
            found, $expected,
            "expected {} denial records for {}, found {}",
            $expected, $actor, found
        )
    }};
}

/// Whether `err` is a refusal by the check routine.
pub fn is_denied(err: &gatekeep_catalog::CatalogError) -> bool {
    err.is_access_denied()
}
