mod consumer;
mod dispatcher;
mod metrics;

pub use consumer::*;
pub use dispatcher::*;
pub use self::metrics::*;
