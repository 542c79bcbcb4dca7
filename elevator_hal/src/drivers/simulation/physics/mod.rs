//! Plant models for the simulation driver.

mod carriage;
mod follower;

pub use carriage::{CarriageSimulator, DriveMode};
pub use follower::FollowerSimulator;
