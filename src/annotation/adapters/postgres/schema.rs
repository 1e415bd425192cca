//! Diesel schema for annotation persistence.

diesel::table! {
    /// Annotation records.
    annotations (id) {
        /// Annotation identifier.
        id -> Uuid,
        /// Annotated task.
        task_id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Authoring annotator.
        annotator_id -> Uuid,
        /// Annotation lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Submission timestamp, if submitted.
        submitted_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-dimension answers, one row per (annotation, dimension).
    annotation_values (annotation_id, dimension_id) {
        /// Owning annotation.
        annotation_id -> Uuid,
        /// Answered dimension.
        dimension_id -> Uuid,
        /// Answer payload, tagged by kind.
        answer -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(annotations, annotation_values);
