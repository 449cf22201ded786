use chrono::{DateTime, Local, NaiveDate, Utc};

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Calendar date of the machine running the scraper, which decides when baselines roll over.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
