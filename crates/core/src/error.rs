use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("destination is required")]
    MissingDestination,
    #[error("end date {end} is before start date {start}")]
    DateOrder { start: NaiveDate, end: NaiveDate },
    #[error("budget must be a positive amount, got {0}")]
    InvalidBudget(f64),
    #[error("unknown recommendation domain `{0}`")]
    UnknownDomain(String),
}
