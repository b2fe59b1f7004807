use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("SCHEDULE_INVALID: {0}")]
    ScheduleParse(String),
    #[error("CANCELLED: {0}")]
    Cancelled(String),
    #[error("VIEW_NOT_FOUND: {0}")]
    UnknownView(String),
    #[error("SETTINGS_INVALID: {0}")]
    Settings(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl DashboardError {
    pub(crate) fn schedule(expression: &str, detail: impl std::fmt::Display) -> Self {
        Self::ScheduleParse(format!("'{}': {}", expression, detail))
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(value: serde_json::Error) -> Self {
        Self::Settings(value.to_string())
    }
}

impl From<serde_yaml::Error> for DashboardError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Settings(value.to_string())
    }
}

impl From<anyhow::Error> for DashboardError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::DashboardError;

    #[test]
    fn schedule_errors_name_the_expression() {
        let err = DashboardError::schedule("0 0 32 * *", "day-of-month value 32 out of range 1-31");
        assert_eq!(
            err.to_string(),
            "SCHEDULE_INVALID: '0 0 32 * *': day-of-month value 32 out of range 1-31"
        );
    }
}
