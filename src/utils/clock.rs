use chrono::{DateTime, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for "today" decisions (on-leave status, rule expiry).
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Test clock pinned to one date at 09:00 UTC. `set` moves it.
#[cfg(test)]
pub struct FixedClock(std::sync::Mutex<NaiveDate>);

#[cfg(test)]
impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self(std::sync::Mutex::new(date))
    }

    pub fn set(&self, date: NaiveDate) {
        *self.0.lock().expect("clock lock") = date;
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.today()
            .and_hms_opt(9, 0, 0)
            .expect("valid time")
            .and_utc()
    }

    fn today(&self) -> NaiveDate {
        *self.0.lock().expect("clock lock")
    }
}
