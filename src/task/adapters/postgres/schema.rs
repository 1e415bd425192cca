//! Diesel schema for task persistence and the skip ledger.

diesel::table! {
    /// Task records with claim assignment fields.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Owning batch, if any.
        batch_id -> Nullable<Uuid>,
        /// Audio file reference.
        #[max_length = 1024]
        audio_file -> Varchar,
        /// Task lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Current claimant, if any.
        assigned_to -> Nullable<Uuid>,
        /// Claim timestamp, if claimed.
        assigned_at -> Nullable<Timestamptz>,
        /// Claim expiry, if claimed.
        expires_at -> Nullable<Timestamptz>,
        /// Completion timestamp, if completed.
        completed_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only skip ledger entries.
    skip_activities (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Skipping user.
        user_id -> Uuid,
        /// Target kind, `task` or `review`.
        #[max_length = 50]
        activity_type -> Varchar,
        /// Skipped task or annotation identifier.
        target_id -> Uuid,
        /// Skip reason.
        #[max_length = 1024]
        reason -> Varchar,
        /// Free-text elaboration, if any.
        description -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
