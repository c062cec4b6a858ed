use robotls_core::library::{KeywordDoc, StdLibrary, RESERVED_LIBRARY_NAME};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "Easter";

const KEYWORDS: &[KeywordSpec] = &[("None Shall Pass", &["who"], "")];

#[derive(Debug)]
pub struct EasterLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for EasterLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl EasterLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for EasterLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}

/// Name kept for old suites; importing it does nothing.
#[derive(Debug)]
pub struct ReservedLibrary;

impl StdLibrary for ReservedLibrary {
    fn name(&self) -> &str {
        RESERVED_LIBRARY_NAME
    }

    fn ignored(&self) -> bool {
        true
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        Vec::new()
    }
}
