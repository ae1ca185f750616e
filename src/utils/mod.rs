pub mod calendar;
pub mod clock;
