use robotls_core::library::{KeywordDoc, LibraryScope, StdLibrary};

use crate::{initializer, keywords_from_table, KeywordSpec};

const NAME: &str = "Screenshot";

const KEYWORDS: &[KeywordSpec] = &[
    ("Set Screenshot Directory", &["path"], "Sets the directory where screenshots are saved."),
    ("Take Screenshot", &["name=screenshot", "width=800px"], "Takes a screenshot in JPEG format and embeds it into the log file."),
    ("Take Screenshot Without Embedding", &["name=screenshot"], "Takes a screenshot and links it from the log file."),
];

/// `Screenshot`: desktop screenshots embedded in logs.
#[derive(Debug)]
pub struct ScreenshotLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for ScreenshotLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenshotLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for ScreenshotLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library for taking screenshots on the machine where tests are executed."
    }

    fn scope(&self) -> LibraryScope {
        LibraryScope::Suite
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }

    fn inits(&self) -> Vec<KeywordDoc> {
        vec![initializer(NAME, &["screenshot_directory=None", "screenshot_module=None"], "Configure where screenshots are saved.")]
    }
}
