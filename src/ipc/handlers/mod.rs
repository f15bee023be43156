pub mod attendance;
pub mod bundles;
pub mod children;
pub mod core;
pub mod dashboard;
pub mod leave;
pub mod notifications;
pub mod results;
pub mod session;
pub mod staff;
pub mod students;
