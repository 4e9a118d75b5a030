pub mod health;
pub mod upload;
