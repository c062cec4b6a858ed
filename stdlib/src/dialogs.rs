use robotls_core::library::{KeywordDoc, StdLibrary};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "Dialogs";

const KEYWORDS: &[KeywordSpec] = &[
    ("Execute Manual Step", &["message", "default_error="], "Pauses execution until user sets the keyword status."),
    ("Get Selection From User", &["message", "*values", "default=None"], "Pauses execution and asks user to select a value."),
    ("Get Selections From User", &["message", "*values"], "Pauses execution and asks user to select multiple values."),
    ("Get Value From User", &["message", "default_value=", "hidden=False"], "Pauses execution and asks user to input a value."),
    ("Pause Execution", &["message=Execution paused. Press OK to continue."], "Pauses execution until user clicks Ok button."),
];

/// `Dialogs`: pausing execution for user input.
#[derive(Debug)]
pub struct DialogsLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for DialogsLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogsLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for DialogsLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library providing dialogs for interacting with users."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
