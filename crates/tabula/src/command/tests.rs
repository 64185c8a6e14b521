use super::batch::max_rows_per_statement;
use super::*;
use crate::error::{TabulaError, ValidationError};

#[test]
fn upsert_plan_covers_every_branch() {
    // Identity key not supplied: plain insert.
    assert_eq!(UpsertPlan::decide(true, false, false), UpsertPlan::Insert);
    assert_eq!(UpsertPlan::decide(true, false, true), UpsertPlan::Insert);
    // Identity key supplied without override: the row already exists.
    assert_eq!(UpsertPlan::decide(true, true, false), UpsertPlan::Update);
    // Identity key supplied with override: atomic upsert.
    assert_eq!(UpsertPlan::decide(true, true, true), UpsertPlan::Merge);
    // Natural keys always merge.
    assert_eq!(UpsertPlan::decide(false, true, false), UpsertPlan::Merge);
    assert_eq!(UpsertPlan::decide(false, false, false), UpsertPlan::Merge);
}

#[test]
fn batch_size_follows_parameter_limit() {
    assert_eq!(max_rows_per_statement(3, Some(2100), &[Some(1000)]), Ok(Some(700)));
    assert_eq!(max_rows_per_statement(1, Some(2100), &[Some(1000)]), Ok(Some(1000)));
    assert_eq!(max_rows_per_statement(3, Some(2100), &[Some(1000), Some(50)]), Ok(Some(50)));
    assert_eq!(max_rows_per_statement(3, None, &[None]), Ok(None));
    assert_eq!(max_rows_per_statement(3, None, &[Some(10)]), Ok(Some(10)));
}

#[test]
fn batch_row_wider_than_limit_is_rejected() {
    assert_eq!(max_rows_per_statement(12, Some(10), &[]), Err(10));
    assert_eq!(max_rows_per_statement(10, Some(10), &[]), Ok(Some(1)));
}

#[test]
fn row_count_checks() {
    assert!(RowCountCheck::Exactly(1).is_satisfied_by(1));
    assert!(!RowCountCheck::Exactly(1).is_satisfied_by(0));
    assert!(!RowCountCheck::Exactly(1).is_satisfied_by(2));
    assert!(RowCountCheck::AtLeast(1).is_satisfied_by(2));
    assert!(!RowCountCheck::AtLeast(1).is_satisfied_by(0));
}

#[test]
fn verify_reports_expected_and_actual() {
    let stmt = PreparedStatement {
        text: "DELETE FROM t WHERE id = $1".into(),
        parameters: Vec::new(),
        row_count_check: Some(RowCountCheck::Exactly(1)),
        target: "public.t".into(),
        operation: crate::builder::OperationKind::Delete,
    };
    assert_eq!(stmt.verify(1).unwrap(), 1);

    let err = stmt.verify(0).unwrap_err();
    assert!(err.is_row_count());
    let TabulaError::RowCount(e) = err else {
        panic!("expected row count error");
    };
    assert_eq!(e.actual, 0);
    assert_eq!(e.expected, "exactly 1 row(s)");
    assert_eq!(e.table, "public.t");

    let unchecked = PreparedStatement {
        row_count_check: None,
        ..stmt
    };
    assert_eq!(unchecked.verify(42).unwrap(), 42);
}

#[test]
fn limit_validation() {
    assert!(Limit::rows(10).validate().is_ok());
    assert!(Limit::rows(10).skip(5).validate().is_ok());

    assert!(matches!(
        Limit::rows(10).skip(-1).validate(),
        Err(TabulaError::Validation(ValidationError::NegativeSkip(-1)))
    ));
    assert!(matches!(
        Limit::rows(0).validate(),
        Err(TabulaError::Validation(ValidationError::NonPositiveTake(0)))
    ));
    assert!(matches!(
        Limit::new(LimitOptions::Percentage, 10).skip(5).validate(),
        Err(TabulaError::Validation(ValidationError::SkipRequiresRows(_)))
    ));
    // A zero skip is allowed with any option.
    assert!(Limit::new(LimitOptions::Percentage, 10).skip(0).validate().is_ok());
}

#[test]
fn key_target_counts_distinct_keys() {
    let target = KeyTarget::list([1, 2, 2, 3, 1]);
    assert_eq!(target.keys().len(), 5);
    assert_eq!(target.distinct_keys().len(), 3);
    assert_eq!(target.expected_rows(), RowCountCheck::Exactly(3));
    assert_eq!(KeyTarget::single(7).expected_rows(), RowCountCheck::Exactly(1));
}
