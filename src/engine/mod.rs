pub mod dispatcher;
pub mod earnings;
pub mod job;
pub mod offer;
pub mod session;
pub mod source;
pub mod timer;
