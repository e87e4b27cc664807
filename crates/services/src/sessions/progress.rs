use exam_core::model::StatusCounts;

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub counts: StatusCounts,
    pub current: usize,
    pub is_complete: bool,
}
