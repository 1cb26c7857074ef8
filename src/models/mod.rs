pub mod candidate;
pub mod history;
pub mod job;
pub mod notification;
pub mod stage;
pub mod user;
