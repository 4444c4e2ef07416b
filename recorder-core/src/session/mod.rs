pub mod notification;
pub mod recorder;
pub mod worker;
