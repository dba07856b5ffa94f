pub mod code;
pub mod kind;
pub mod labels;
pub mod model;
pub mod prelude;
pub mod retry;
pub mod severity;
