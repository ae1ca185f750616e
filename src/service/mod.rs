pub mod automation;
pub mod compensation;
pub mod leave;
pub mod notifier;
