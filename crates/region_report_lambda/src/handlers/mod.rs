pub mod notify;
pub mod pipeline;
pub mod publish;
pub mod retention;
pub mod source;
