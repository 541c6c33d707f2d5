pub mod archive;
pub mod message;
