pub mod audit_log;
pub mod automation_rule;
pub mod employee;
pub mod leave_request;
pub mod notification;
pub mod role;
pub mod task;
