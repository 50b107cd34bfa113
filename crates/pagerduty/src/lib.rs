pub mod schedule;

pub use schedule::{OnCallUser, PagerDutyClient, PagerDutyError};
