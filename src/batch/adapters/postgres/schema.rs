//! Diesel schema for batch persistence.

diesel::table! {
    /// Batch records with lifecycle status and derived counters.
    batches (id) {
        /// Batch identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Batch name.
        #[max_length = 255]
        name -> Varchar,
        /// Batch lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Total member tasks.
        total_tasks -> Int4,
        /// Member tasks in a completed status.
        completed_tasks -> Int4,
        /// Member tasks approved by review.
        approved_tasks -> Int4,
        /// Member tasks rejected by review.
        rejected_tasks -> Int4,
        /// Derived completion percentage.
        completion_percentage -> Float4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Completion timestamp, if completed.
        completed_at -> Nullable<Timestamptz>,
    }
}
