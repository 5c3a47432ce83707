/// Where a monitoring session stands, as a consumer would show it.
#[derive(Debug, Clone)]
pub enum ProcessingState {
    /// Not monitoring anything
    Idle,
    /// Monitoring; `indicating` is set while a log folder is being watched
    Watching { indicating: bool },
    Processing,
    Completed { succeeded: bool, label: String },
}

impl ProcessingState {
    pub const WAITING_LABEL: &'static str = "Waiting...";
    pub const PROCESSING_LABEL: &'static str = "Processing log...";
    pub const COMPLETED_LABEL: &'static str = "Completed";
    pub const CANCELLED_LABEL: &'static str = "Cancelled";
    pub const FAILED_LABEL: &'static str = "No valid logs found";

    /// Terminal state for a pass that delivered `record_count` records.
    pub fn completed(record_count: usize, cancelled: bool) -> Self {
        let succeeded = record_count > 0;
        let label = if cancelled {
            Self::CANCELLED_LABEL
        } else if succeeded {
            Self::COMPLETED_LABEL
        } else {
            Self::FAILED_LABEL
        };
        Self::Completed {
            succeeded,
            label: label.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Watching { .. } => Self::WAITING_LABEL,
            Self::Processing => Self::PROCESSING_LABEL,
            Self::Completed { label, .. } => label,
        }
    }
}

impl PartialEq for ProcessingState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Idle, Self::Idle) | (Self::Processing, Self::Processing) => true,
            (Self::Watching { indicating: a }, Self::Watching { indicating: b }) => a == b,
            (Self::Completed { succeeded: a, .. }, Self::Completed { succeeded: b, .. }) => a == b,
            _ => false,
        }
    }
}
