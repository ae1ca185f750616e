pub mod automation;
pub mod leave_request;
