//! Diesel schema for project persistence.

diesel::table! {
    /// Project records with lifecycle status and time-box settings.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Project name.
        #[max_length = 255]
        name -> Varchar,
        /// Project lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Minutes granted per task claim.
        task_time_minutes -> Int4,
        /// Minutes granted per review.
        review_time_minutes -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Annotation dimension records with their per-kind schema payload.
    annotation_dimensions (id) {
        /// Dimension identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Dimension name.
        #[max_length = 255]
        name -> Varchar,
        /// Per-kind configuration (choices or scale bounds).
        schema -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project membership records.
    project_members (project_id, user_id) {
        /// Owning project.
        project_id -> Uuid,
        /// Member user.
        user_id -> Uuid,
        /// Granted role.
        #[max_length = 50]
        role -> Varchar,
        /// Whether the membership is active.
        active -> Bool,
        /// Timestamp the membership was granted.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(projects, annotation_dimensions, project_members);
