use robotls_core::library::{KeywordDoc, LibraryScope, StdLibrary};

use crate::{initializer, keywords_from_table, KeywordSpec};

const NAME: &str = "Telnet";

const INIT_ARGS: &[&str] = &[
    "timeout=3 seconds",
    "newline=CRLF",
    "prompt=None",
    "prompt_is_regexp=False",
    "encoding=UTF-8",
    "encoding_errors=ignore",
    "default_log_level=INFO",
    "window_size=None",
    "environ_user=None",
    "terminal_emulation=False",
    "terminal_type=None",
    "telnetlib_log_level=TRACE",
    "connection_timeout=None",
];

const KEYWORDS: &[KeywordSpec] = &[
    ("Close All Connections", &[], "Closes all open connections and empties the connection cache."),
    ("Close Connection", &["loglevel=None"], "Closes the current Telnet connection."),
    ("Execute Command", &["command", "loglevel=None", "strip_prompt=False"], "Executes the given command and reads, logs, and returns everything until the prompt."),
    ("Login", &["username", "password", "login_prompt=login: ", "password_prompt=Password: ", "login_timeout=1 second", "login_incorrect=Login incorrect"], "Logs in to the Telnet server with the given user information."),
    ("Open Connection", &["host", "alias=None", "port=23", "timeout=None", "newline=None", "prompt=None", "prompt_is_regexp=False", "encoding=None", "encoding_errors=None", "default_log_level=None", "window_size=None", "environ_user=None", "terminal_emulation=None", "terminal_type=None", "telnetlib_log_level=None", "connection_timeout=None"], "Opens a new Telnet connection to the given host and port."),
    ("Read", &["loglevel=None"], "Reads everything that is currently available in the output."),
    ("Read Until", &["expected", "loglevel=None"], "Reads output until expected text is encountered."),
    ("Read Until Prompt", &["loglevel=None", "strip_prompt=False"], "Reads output until the prompt is encountered."),
    ("Read Until Regexp", &["*expected"], "Reads output until any of the expected regular expressions match."),
    ("Set Default Log Level", &["level"], "Sets the default log level used for logging in the current connection."),
    ("Set Encoding", &["encoding=None", "errors=None"], "Sets the encoding to use for writing and reading in the current connection."),
    ("Set Newline", &["newline"], "Sets the newline used by Write keyword in the current connection."),
    ("Set Prompt", &["prompt", "prompt_is_regexp=False"], "Sets the prompt used by Read Until Prompt and Login in the current connection."),
    ("Set Telnetlib Log Level", &["level"], "Sets the log level used for logging in the underlying telnetlib."),
    ("Set Timeout", &["timeout"], "Sets the timeout used for waiting output in the current connection."),
    ("Switch Connection", &["index_or_alias"], "Switches between active connections using an index or an alias."),
    ("Write", &["text", "loglevel=None"], "Writes the given text plus a newline into the connection."),
    ("Write Bare", &["text"], "Writes the given text, and nothing else, into the connection."),
    ("Write Control Character", &["character"], "Writes the given control character into the connection."),
    ("Write Until Expected Output", &["text", "expected", "timeout", "retry_interval", "loglevel=None"], "Writes the given text repeatedly, until expected appears in the output."),
];

/// `Telnet`: connections to Telnet servers.
#[derive(Debug)]
pub struct TelnetLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for TelnetLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for TelnetLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library providing communication over Telnet connections."
    }

    fn scope(&self) -> LibraryScope {
        LibraryScope::Suite
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }

    fn inits(&self) -> Vec<KeywordDoc> {
        vec![initializer(NAME, INIT_ARGS, "Telnet library can be imported with optional configuration parameters.")]
    }
}
