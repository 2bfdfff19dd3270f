//! 백그라운드 서비스.

pub mod maintenance;

pub use maintenance::{start_maintenance_service, MaintenanceService};
