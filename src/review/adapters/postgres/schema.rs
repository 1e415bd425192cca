//! Diesel schema for review persistence.

diesel::table! {
    /// Review records with time-box and outcome fields.
    reviews (id) {
        /// Review identifier.
        id -> Uuid,
        /// Reviewed annotation.
        annotation_id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Owning reviewer.
        reviewer_id -> Uuid,
        /// Start timestamp.
        started_at -> Timestamptz,
        /// Time-box expiry.
        expires_at -> Timestamptz,
        /// Outcome, if finalized.
        #[max_length = 50]
        action -> Nullable<Varchar>,
        /// Reviewer feedback, if any.
        feedback -> Nullable<Text>,
        /// Close timestamp, if closed.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only correction records.
    review_changes (id) {
        /// Change record identifier.
        id -> Uuid,
        /// Owning review.
        review_id -> Uuid,
        /// Corrected dimension.
        dimension_id -> Uuid,
        /// Answer as the annotator left it.
        original -> Jsonb,
        /// Answer as the reviewer corrected it.
        corrected -> Jsonb,
        /// Optional reason for the correction.
        reason -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(reviews, review_changes);
