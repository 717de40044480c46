mod compiler;
mod prefix;
mod table_name;

pub use compiler::*;
pub use prefix::*;
pub use table_name::*;
