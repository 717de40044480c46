pub mod pipeline;
pub mod postgres;

pub use pipeline::*;
pub use postgres::*;
