use std::fmt::Display;

use lazy_format::lazy_format;
use num_format::{Locale, ToFormattedString};

use crate::schema::UserRecord;

/// `#3 alice: 1,234 posts (+12)`; the increase is only shown when positive.
pub fn make_message(record: &UserRecord) -> impl Display + '_ {
    let increase = lazy_format!(
        if record.daily_increase > 0 => (" (+{})", record.daily_increase)
        else => ""
    );
    lazy_format!(
        "#{} {}: {} posts{}",
        record.rank,
        record.username,
        record.post_count.to_formatted_string(&Locale::en),
        increase
    )
}
