pub mod earnings;
pub mod event;
pub mod job;
pub mod offer;
