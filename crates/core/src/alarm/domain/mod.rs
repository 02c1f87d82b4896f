pub mod alarm_error;
pub mod decision;
pub mod reference_cache;
pub mod sensitivity;
pub mod watch_task;
