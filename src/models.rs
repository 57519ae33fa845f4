pub mod credentials;
pub mod device;
pub mod health;
pub mod message;
