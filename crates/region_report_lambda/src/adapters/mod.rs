pub mod local_fs;
#[cfg(feature = "test-helpers")]
pub mod memory;
pub mod message_bus;
pub mod object_store;
pub mod s3;
