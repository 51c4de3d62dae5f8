pub mod controller;
pub mod countdown;
pub mod timer;

pub use controller::{ControllerSettings, QueueController, QueueSnapshot, RampPlan};
pub use countdown::TickOutcome;
