/// UI module exports
pub mod dashboard;

pub use dashboard::{Dashboard, DashboardProps};
