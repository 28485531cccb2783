pub mod calendar;
pub mod health;
pub mod insights;
pub mod logs;
