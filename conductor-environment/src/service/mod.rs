mod controller;
mod locator;
mod logs;
mod signal;

pub use controller::*;
pub use locator::*;
pub use logs::*;
pub use signal::*;
