pub mod audit_logger;
pub mod evaluate_alarm_use_case;
