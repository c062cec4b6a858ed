use robotls_core::library::{KeywordDoc, StdLibrary};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "OperatingSystem";

const KEYWORDS: &[KeywordSpec] = &[
    ("Append To Environment Variable", &["name", "*values", "separator=os.pathsep"], "Appends given values to environment variable name."),
    ("Append To File", &["path", "content", "encoding=UTF-8"], "Appends the given content to the specified file."),
    ("Copy Directory", &["source", "destination"], "Copies the source directory into the destination."),
    ("Copy File", &["source", "destination"], "Copies the source file into the destination."),
    ("Copy Files", &["*sources_and_destination"], "Copies specified files to the target directory."),
    ("Count Directories In Directory", &["path", "pattern=None"], "Wrapper for Count Items In Directory returning only directory count."),
    ("Count Files In Directory", &["path", "pattern=None"], "Wrapper for Count Items In Directory returning only file count."),
    ("Count Items In Directory", &["path", "pattern=None"], "Returns and logs the number of all items in the given directory."),
    ("Create Binary File", &["path", "content"], "Creates a binary file with the given content."),
    ("Create Directory", &["path"], "Creates the specified directory."),
    ("Create File", &["path", "content=", "encoding=UTF-8"], "Creates a file with the given content and encoding."),
    ("Directory Should Be Empty", &["path", "msg=None"], "Fails unless the specified directory is empty."),
    ("Directory Should Exist", &["path", "msg=None"], "Fails unless the given path points to an existing directory."),
    ("Directory Should Not Be Empty", &["path", "msg=None"], "Fails if the specified directory is empty."),
    ("Directory Should Not Exist", &["path", "msg=None"], "Fails if the given path points to an existing file."),
    ("Empty Directory", &["path"], "Deletes all the content from the given directory."),
    ("Environment Variable Should Be Set", &["name", "msg=None"], "Fails if the specified environment variable is not set."),
    ("Environment Variable Should Not Be Set", &["name", "msg=None"], "Fails if the specified environment variable is set."),
    ("File Should Be Empty", &["path", "msg=None"], "Fails unless the specified file is empty."),
    ("File Should Exist", &["path", "msg=None"], "Fails unless the given path points to an existing file."),
    ("File Should Not Be Empty", &["path", "msg=None"], "Fails if the specified file is empty."),
    ("File Should Not Exist", &["path", "msg=None"], "Fails if the given path points to an existing file."),
    ("Get Binary File", &["path"], "Returns the contents of a specified file."),
    ("Get Environment Variable", &["name", "default=None"], "Returns the value of an environment variable with the given name."),
    ("Get Environment Variables", &[], "Returns currently available environment variables as a dictionary."),
    ("Get File", &["path", "encoding=UTF-8", "encoding_errors=strict"], "Returns the contents of a specified file."),
    ("Get File Size", &["path"], "Returns and logs file size as an integer in bytes."),
    ("Get Modified Time", &["path", "format=timestamp"], "Returns the last modification time of a file or directory."),
    ("Grep File", &["path", "pattern", "encoding=UTF-8", "encoding_errors=strict", "regexp=False"], "Returns the lines of the specified file that match the pattern."),
    ("Join Path", &["base", "*parts"], "Joins the given path part(s) to the given base path."),
    ("Join Paths", &["base", "*paths"], "Joins given paths with base and returns resulted paths."),
    ("List Directories In Directory", &["path", "pattern=None", "absolute=False"], "Wrapper for List Directory that returns only directories."),
    ("List Directory", &["path", "pattern=None", "absolute=False"], "Returns and logs items in a directory, optionally filtered with pattern."),
    ("List Files In Directory", &["path", "pattern=None", "absolute=False"], "Wrapper for List Directory that returns only files."),
    ("Log Environment Variables", &["level=INFO"], "Logs all environment variables using the given log level."),
    ("Log File", &["path", "encoding=UTF-8", "encoding_errors=strict"], "Wrapper for Get File that also logs the returned file."),
    ("Move Directory", &["source", "destination"], "Moves the source directory into a destination."),
    ("Move File", &["source", "destination"], "Moves the source file into the destination."),
    ("Move Files", &["*sources_and_destination"], "Moves specified files to the target directory."),
    ("Normalize Path", &["path", "case_normalize=False"], "Normalizes the given path."),
    ("Remove Directory", &["path", "recursive=False"], "Removes the directory pointed to by the given path."),
    ("Remove Environment Variable", &["*names"], "Deletes the specified environment variable."),
    ("Remove File", &["path"], "Removes a file with the given path."),
    ("Remove Files", &["*paths"], "Uses Remove File to remove multiple files one-by-one."),
    ("Run", &["command"], "*DEPRECATED* Use the Process library instead."),
    ("Run And Return Rc", &["command"], "*DEPRECATED* Use the Process library instead."),
    ("Run And Return Rc And Output", &["command"], "*DEPRECATED* Use the Process library instead."),
    ("Set Environment Variable", &["name", "value"], "Sets an environment variable to a specified value."),
    ("Set Modified Time", &["path", "mtime"], "Sets the file modification and access times."),
    ("Should Exist", &["path", "msg=None"], "Fails unless the given path (file or directory) exists."),
    ("Should Not Exist", &["path", "msg=None"], "Fails if the given path (file or directory) exists."),
    ("Split Extension", &["path"], "Splits the extension from the given path."),
    ("Split Path", &["path"], "Splits the given path from the last path separator."),
    ("Touch", &["path"], "Emulates the UNIX touch command."),
    ("Wait Until Created", &["path", "timeout=1 minute"], "Waits until the given file or directory is created."),
    ("Wait Until Removed", &["path", "timeout=1 minute"], "Waits until the given file or directory is removed."),
];

/// `OperatingSystem`: files, directories and environment variables.
#[derive(Debug)]
pub struct OperatingSystemLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for OperatingSystemLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatingSystemLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for OperatingSystemLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library providing keywords for operating system related tasks."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
