pub mod spool;
pub mod upload;
