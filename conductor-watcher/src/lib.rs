pub mod algebra;
pub mod domain;
pub mod mock;
pub mod server;
pub mod stream;
