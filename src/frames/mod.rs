pub mod compose;
pub mod decode;
pub mod types;
