use robotls_core::library::{KeywordDoc, StdLibrary};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "DateTime";

const KEYWORDS: &[KeywordSpec] = &[
    ("Add Time To Date", &["date", "time", "result_format=timestamp", "exclude_millis=False", "date_format=None"], "Adds time to date and returns the resulting date."),
    ("Add Time To Time", &["time1", "time2", "result_format=number", "exclude_millis=False"], "Adds time to another time and returns the resulting time."),
    ("Convert Date", &["date", "result_format=timestamp", "exclude_millis=False", "date_format=None"], "Converts between supported date formats."),
    ("Convert Time", &["time", "result_format=number", "exclude_millis=False"], "Converts between supported time formats."),
    ("Get Current Date", &["time_zone=local", "increment=0", "result_format=timestamp", "exclude_millis=False"], "Returns current local or UTC time with an optional increment."),
    ("Subtract Date From Date", &["date1", "date2", "result_format=number", "exclude_millis=False", "date1_format=None", "date2_format=None"], "Subtracts date from another date and returns time between."),
    ("Subtract Time From Date", &["date", "time", "result_format=timestamp", "exclude_millis=False", "date_format=None"], "Subtracts time from date and returns the resulting date."),
    ("Subtract Time From Time", &["time1", "time2", "result_format=number", "exclude_millis=False"], "Subtracts time from another time and returns the resulting time."),
];

/// `DateTime`: date and time conversions.
#[derive(Debug)]
pub struct DateTimeLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for DateTimeLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl DateTimeLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for DateTimeLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library for handling date and time values."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
