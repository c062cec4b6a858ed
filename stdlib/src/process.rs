use robotls_core::library::{KeywordDoc, StdLibrary};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "Process";

const KEYWORDS: &[KeywordSpec] = &[
    ("Get Process Id", &["handle=None"], "Returns the process ID (pid) of the process as an integer."),
    ("Get Process Object", &["handle=None"], "Return the underlying subprocess.Popen object."),
    ("Get Process Result", &["handle=None", "rc=False", "stdout=False", "stderr=False", "stdout_path=False", "stderr_path=False"], "Returns the specified result object or some of its attributes."),
    ("Is Process Running", &["handle=None"], "Checks is the process running or not."),
    ("Join Command Line", &["*args"], "Joins arguments into one command line string."),
    ("Process Should Be Running", &["handle=None", "error_message=Process is not running."], "Verifies that the process is running."),
    ("Process Should Be Stopped", &["handle=None", "error_message=Process is running."], "Verifies that the process is not running."),
    ("Run Process", &["command", "*arguments", "**configuration"], "Runs a process and waits for it to complete."),
    ("Send Signal To Process", &["signal", "handle=None", "group=False"], "Sends the given signal to the specified process."),
    ("Split Command Line", &["args", "escaping=False"], "Splits command line string into a list of arguments."),
    ("Start Process", &["command", "*arguments", "**configuration"], "Starts a new process on background."),
    ("Switch Process", &["handle"], "Makes the specified process the current active process."),
    ("Terminate All Processes", &["kill=False"], "Terminates all still running processes started by this library."),
    ("Terminate Process", &["handle=None", "kill=False"], "Stops the process gracefully or forcefully."),
    ("Wait For Process", &["handle=None", "timeout=None", "on_timeout=continue"], "Waits for the process to complete or to reach the given timeout."),
];

/// `Process`: running and inspecting child processes.
#[derive(Debug)]
pub struct ProcessLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for ProcessLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for ProcessLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library for running processes."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
