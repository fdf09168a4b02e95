/// Asserts that two floats differ by at most `tol`.
#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr, $tol:expr) => {
        let (actual, expected): (f64, f64) = ($actual, $expected);
        assert!(
            (actual - expected).abs() <= $tol,
            "{} is not within {} of {}",
            actual,
            $tol,
            expected
        );
    };
}

/// Asserts that every schema field of an organism is present and in range.
#[macro_export]
macro_rules! assert_traits_in_schema {
    ($traits:expr) => {
        let issues = chainspawn_core::analysis::validate_traits(&$traits);
        assert!(
            issues.is_empty(),
            "Organism {} violates the schema: {:?}",
            $traits.organism_id,
            issues
        );
    };
}

/// Asserts that an allocation's counters are internally consistent.
#[macro_export]
macro_rules! assert_conserved {
    ($result:expr) => {
        let issues = chainspawn_core::analysis::allocation_issues(&$result);
        assert!(issues.is_empty(), "Allocation is inconsistent: {:?}", issues);
    };
}
