/// Workflow states of the defect board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefectStatus {
    ToDo,
    InProgress,
    Blocked,
    ReadyToTest,
    Reviewing,
    Done,
    Canceled,
}

/// Statuses shown on the dashboard, in display order.
pub const DEFECT_STATUS_ORDER: [DefectStatus; 5] = [
    DefectStatus::ToDo,
    DefectStatus::InProgress,
    DefectStatus::Blocked,
    DefectStatus::ReadyToTest,
    DefectStatus::Reviewing,
];

/// Statuses tracked day by day on the trend chart.
pub const TREND_STATUSES: [DefectStatus; 3] = [
    DefectStatus::ToDo,
    DefectStatus::InProgress,
    DefectStatus::Done,
];

impl DefectStatus {
    pub const ALL: [DefectStatus; 7] = [
        DefectStatus::ToDo,
        DefectStatus::InProgress,
        DefectStatus::Blocked,
        DefectStatus::ReadyToTest,
        DefectStatus::Reviewing,
        DefectStatus::Done,
        DefectStatus::Canceled,
    ];

    /// Name as configured in the Jira workflow.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Blocked => "Blocked",
            Self::ReadyToTest => "Ready to test",
            Self::Reviewing => "Reviewing",
            Self::Done => "Done",
            Self::Canceled => "Canceled",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    pub fn chart_color(self) -> &'static str {
        match self {
            Self::Blocked => "var(--chart-1)",
            Self::InProgress | Self::Canceled => "var(--chart-2)",
            Self::ReadyToTest | Self::Done => "var(--chart-3)",
            Self::Reviewing => "var(--chart-4)",
            Self::ToDo => "var(--chart-5)",
        }
    }

    /// Closed states are left out of the pie chart.
    pub fn excluded_from_chart(self) -> bool {
        matches!(self, Self::Done | Self::Canceled)
    }
}

impl std::fmt::Display for DefectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn status_names(statuses: &[DefectStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}
