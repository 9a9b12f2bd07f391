pub mod addr;
pub mod probe;
pub mod queue;
