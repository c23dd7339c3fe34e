pub mod batch;
pub mod error;
pub mod health;
pub mod predict;
pub mod satellite;
pub mod solar;
