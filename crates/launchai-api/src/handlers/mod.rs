pub mod chat;
pub mod health;
pub mod insights;
pub mod providers;
