pub mod algebra;
pub mod domain;
pub mod driver;
pub mod mock;
pub mod service;
