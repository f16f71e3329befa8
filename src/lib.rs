//! Client-side coordination of server-side tool jobs for a multi-channel
//! image-stack viewer: submission, recurring status polling, result
//! reconciliation, and plane (time point / z-plane) synchronization.

pub mod model;
pub mod monitor;
pub mod remote;
pub mod results;
pub mod viewer;
