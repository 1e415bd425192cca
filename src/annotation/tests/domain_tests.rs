//! Domain tests for the annotation status machine and answer validation.

use crate::annotation::domain::{
    Annotation, AnnotationDomainError, AnnotationStatus, AnnotationValidationError,
    DimensionAnswer, validate_answers,
};
use crate::project::domain::{
    AnnotationDimension, DimensionId, DimensionSchema, DimensionValue, ProjectId,
};
use crate::task::domain::TaskId;
use crate::test_support::FixedClock;
use mockable::Clock;
use rstest::rstest;

fn draft() -> Annotation {
    Annotation::new(
        TaskId::new(),
        ProjectId::new(),
        crate::project::domain::UserId::new(),
        FixedClock::base().utc(),
    )
}

fn categorical_dimension() -> AnnotationDimension {
    let schema = DimensionSchema::categorical([
        DimensionValue::new("clear").expect("valid choice"),
        DimensionValue::new("noisy").expect("valid choice"),
    ])
    .expect("valid schema");
    AnnotationDimension::new(ProjectId::new(), "audio_quality", schema, &FixedClock::base())
        .expect("valid dimension")
}

fn scale_dimension() -> AnnotationDimension {
    let schema = DimensionSchema::numeric_scale(1, 5).expect("valid schema");
    AnnotationDimension::new(ProjectId::new(), "fluency", schema, &FixedClock::base())
        .expect("valid dimension")
}

#[rstest]
fn annotations_start_as_drafts() {
    let annotation = draft();
    assert_eq!(annotation.status(), AnnotationStatus::Draft);
    assert!(annotation.submitted_at().is_none());
}

#[rstest]
fn submit_records_the_submission_time() {
    let now = FixedClock::base().utc();
    let mut annotation = draft();

    annotation.submit(now).expect("submit should succeed");
    assert_eq!(annotation.status(), AnnotationStatus::Submitted);
    assert_eq!(annotation.submitted_at(), Some(now));
}

#[rstest]
fn touch_draft_is_limited_to_drafts() {
    let now = FixedClock::base().utc();
    let mut annotation = draft();
    annotation.submit(now).expect("submit should succeed");

    let result = annotation.touch_draft(now);
    assert!(matches!(
        result,
        Err(AnnotationDomainError::InvalidStateTransition { .. })
    ));
}

#[rstest]
fn review_cycle_walks_submitted_under_review_and_back() {
    let now = FixedClock::base().utc();
    let mut annotation = draft();
    annotation.submit(now).expect("submit should succeed");

    annotation
        .begin_review(now)
        .expect("begin_review should succeed");
    assert_eq!(annotation.status(), AnnotationStatus::UnderReview);

    annotation
        .revert_to_submitted(now)
        .expect("revert should succeed");
    assert_eq!(annotation.status(), AnnotationStatus::Submitted);
}

#[rstest]
fn begin_review_requires_a_submitted_annotation() {
    let now = FixedClock::base().utc();
    let mut annotation = draft();

    let result = annotation.begin_review(now);
    assert!(matches!(
        result,
        Err(AnnotationDomainError::InvalidStateTransition { .. })
    ));
}

#[rstest]
fn review_outcomes_are_terminal() {
    let now = FixedClock::base().utc();
    let mut annotation = draft();
    annotation.submit(now).expect("submit should succeed");
    annotation
        .begin_review(now)
        .expect("begin_review should succeed");

    annotation.approve(now).expect("approve should succeed");
    assert_eq!(annotation.status(), AnnotationStatus::Approved);
    assert!(annotation.status().is_terminal());

    let result = annotation.reject(now);
    assert!(matches!(
        result,
        Err(AnnotationDomainError::InvalidStateTransition { .. })
    ));
}

#[rstest]
fn approve_requires_an_annotation_under_review() {
    let now = FixedClock::base().utc();
    let mut annotation = draft();

    let result = annotation.approve(now);
    assert!(matches!(
        result,
        Err(AnnotationDomainError::InvalidStateTransition { .. })
    ));
}

#[rstest]
fn valid_answers_pass_validation() {
    let categorical = categorical_dimension();
    let scale = scale_dimension();
    let answers = vec![
        (
            categorical.id(),
            DimensionAnswer::Categorical("clear".into()),
        ),
        (scale.id(), DimensionAnswer::Scale(3)),
    ];

    let result = validate_answers(&[categorical, scale], &answers);
    assert!(result.is_ok());
}

#[rstest]
fn unknown_dimensions_are_rejected() {
    let unknown = DimensionId::new();
    let answers = vec![(unknown, DimensionAnswer::Scale(3))];

    let result = validate_answers(&[scale_dimension()], &answers);
    assert_eq!(
        result,
        Err(AnnotationValidationError::UnknownDimension(unknown))
    );
}

#[rstest]
fn duplicate_dimensions_are_rejected() {
    let dimension = scale_dimension();
    let answers = vec![
        (dimension.id(), DimensionAnswer::Scale(3)),
        (dimension.id(), DimensionAnswer::Scale(4)),
    ];

    let result = validate_answers(&[dimension.clone()], &answers);
    assert_eq!(
        result,
        Err(AnnotationValidationError::DuplicateDimension(dimension.id()))
    );
}

#[rstest]
fn answer_kind_must_match_the_dimension_kind() {
    let dimension = categorical_dimension();
    let answers = vec![(dimension.id(), DimensionAnswer::Scale(2))];

    let result = validate_answers(&[dimension.clone()], &answers);
    assert_eq!(
        result,
        Err(AnnotationValidationError::WrongAnswerKind {
            dimension_id: dimension.id(),
            expected: "categorical",
        })
    );
}

#[rstest]
fn unconfigured_choices_are_rejected() {
    let dimension = categorical_dimension();
    let answers = vec![(
        dimension.id(),
        DimensionAnswer::Categorical("garbled".into()),
    )];

    let result = validate_answers(&[dimension.clone()], &answers);
    assert_eq!(
        result,
        Err(AnnotationValidationError::UnconfiguredChoice {
            dimension_id: dimension.id(),
            choice: "garbled".into(),
        })
    );
}

#[rstest]
#[case(0)]
#[case(6)]
fn out_of_range_scale_points_are_rejected(#[case] point: i32) {
    let dimension = scale_dimension();
    let answers = vec![(dimension.id(), DimensionAnswer::Scale(point))];

    let result = validate_answers(&[dimension.clone()], &answers);
    assert_eq!(
        result,
        Err(AnnotationValidationError::OutOfRangeScalePoint {
            dimension_id: dimension.id(),
            point,
        })
    );
}
