use robotls_core::library::{KeywordDoc, StdLibrary};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "String";

const KEYWORDS: &[KeywordSpec] = &[
    ("Convert To Lower Case", &["string"], "Converts string to lower case."),
    ("Convert To Title Case", &["string", "exclude=None"], "Converts string to title case."),
    ("Convert To Upper Case", &["string"], "Converts string to upper case."),
    ("Decode Bytes To String", &["bytes", "encoding", "errors=strict"], "Decodes the given bytes to a string using the given encoding."),
    ("Encode String To Bytes", &["string", "encoding", "errors=strict"], "Encodes the given string to bytes using the given encoding."),
    ("Fetch From Left", &["string", "marker"], "Returns contents of the string before the first occurrence of marker."),
    ("Fetch From Right", &["string", "marker"], "Returns contents of the string after the last occurrence of marker."),
    ("Format String", &["template", "*positional", "**named"], "Formats a template using the given positional and named arguments."),
    ("Generate Random String", &["length=8", "chars=[LETTERS][NUMBERS]"], "Generates a string with a desired length from the given chars."),
    ("Get Line", &["string", "line_number"], "Returns the specified line from the given string."),
    ("Get Line Count", &["string"], "Returns and logs the number of lines in the given string."),
    ("Get Lines Containing String", &["string", "pattern", "case_insensitive=False"], "Returns lines of the given string that contain the pattern."),
    ("Get Lines Matching Pattern", &["string", "pattern", "case_insensitive=False"], "Returns lines of the given string that match the glob pattern."),
    ("Get Lines Matching Regexp", &["string", "pattern", "partial_match=False", "flags=None"], "Returns lines of the given string that match the regexp pattern."),
    ("Get Regexp Matches", &["string", "pattern", "*groups", "flags=None"], "Returns a list of all non-overlapping matches in the given string."),
    ("Get Substring", &["string", "start", "end=None"], "Returns a substring from start index to end index."),
    ("Remove String", &["string", "*removables"], "Removes all removables from the given string."),
    ("Remove String Using Regexp", &["string", "*patterns", "flags=None"], "Removes patterns from the given string."),
    ("Replace String", &["string", "search_for", "replace_with", "count=-1"], "Replaces search_for in the given string with replace_with."),
    ("Replace String Using Regexp", &["string", "pattern", "replace_with", "count=-1", "flags=None"], "Replaces pattern in the given string with replace_with."),
    ("Should Be Byte String", &["item", "msg=None"], "Fails if the given item is not a byte string."),
    ("Should Be Lower Case", &["string", "msg=None"], "Fails if the given string is not in lower case."),
    ("Should Be String", &["item", "msg=None"], "Fails if the given item is not a string."),
    ("Should Be Title Case", &["string", "msg=None", "exclude=None"], "Fails if given string is not title."),
    ("Should Be Upper Case", &["string", "msg=None"], "Fails if the given string is not in upper case."),
    ("Should Not Be String", &["item", "msg=None"], "Fails if the given item is a string."),
    ("Split String", &["string", "separator=None", "max_split=-1"], "Splits the string using separator as a delimiter string."),
    ("Split String From Right", &["string", "separator=None", "max_split=-1"], "Splits the string using separator starting from right."),
    ("Split String To Characters", &["string"], "Splits the given string to characters."),
    ("Split To Lines", &["string", "start=0", "end=None"], "Splits the given string to lines."),
    ("Strip String", &["string", "mode=both", "characters=None"], "Remove leading and/or trailing whitespaces from the given string."),
];

/// `String`: string manipulation and verification.
#[derive(Debug)]
pub struct StringLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for StringLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl StringLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for StringLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library for string manipulation and verification."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
