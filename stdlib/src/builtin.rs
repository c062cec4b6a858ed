use robotls_core::library::{KeywordDoc, LibraryScope, StdLibrary, BUILTIN_LIBRARY_NAME};

use crate::{keywords_from_table, KeywordSpec};

const KEYWORDS: &[KeywordSpec] = &[
    ("Call Method", &["object", "method_name", "*args", "**kwargs"], "Calls the named method of the given object with the provided arguments."),
    ("Catenate", &["*items"], "Catenates the given items together and returns the resulted string.\n\nBy default, items are catenated with spaces. If the first item is `SEPARATOR=<sep>`, the separator is used instead."),
    ("Comment", &["*messages"], "Displays the given messages in the log file as keyword arguments.\n\nThis keyword does nothing with the arguments it receives."),
    ("Continue For Loop", &[], "*DEPRECATED* Use the CONTINUE statement instead.\n\nSkips the current FOR loop iteration and continues from the next."),
    ("Continue For Loop If", &["condition"], "*DEPRECATED* Use IF and CONTINUE instead.\n\nSkips the current FOR loop iteration if the condition is true."),
    ("Convert To Binary", &["item", "base=None", "prefix=None", "length=None"], "Converts the given item to a binary string."),
    ("Convert To Boolean", &["item"], "Converts the given item to Boolean true or false."),
    ("Convert To Bytes", &["input", "input_type=text"], "Converts the given input to bytes according to the input_type."),
    ("Convert To Hex", &["item", "base=None", "prefix=None", "length=None", "lowercase=False"], "Converts the given item to a hexadecimal string."),
    ("Convert To Integer", &["item", "base=None"], "Converts the given item to an integer number."),
    ("Convert To Number", &["item", "precision=None"], "Converts the given item to a floating point number."),
    ("Convert To Octal", &["item", "base=None", "prefix=None", "length=None"], "Converts the given item to an octal string."),
    ("Convert To String", &["item"], "Converts the given item to a Unicode string."),
    ("Create Dictionary", &["*items"], "Creates and returns a dictionary based on the given items.\n\nItems are typically given using the `key=value` syntax."),
    ("Create List", &["*items"], "Returns a list containing given items."),
    ("Evaluate", &["expression", "modules=None", "namespace=None"], "Evaluates the given expression in Python and returns the result.\n\nVariables used like `$name` are replaced with their actual values."),
    ("Exit For Loop", &[], "*DEPRECATED* Use the BREAK statement instead.\n\nStops executing the enclosing FOR loop."),
    ("Exit For Loop If", &["condition"], "*DEPRECATED* Use IF and BREAK instead.\n\nStops executing the enclosing FOR loop if the condition is true."),
    ("Fail", &["msg=None", "*tags"], "Fails the test with the given message and optionally alters its tags."),
    ("Fatal Error", &["msg=None"], "Stops the whole test execution."),
    ("Get Count", &["container", "item"], "Returns and logs how many times item is found from container."),
    ("Get Length", &["item"], "Returns and logs the length of the given item as an integer."),
    ("Get Library Instance", &["name=None", "all=False"], "Returns the currently active instance of the specified library."),
    ("Get Time", &["format=timestamp", "time_=NOW"], "Returns the given time in the requested format."),
    ("Get Variable Value", &["name", "default=None"], "Returns variable value or default if the variable does not exist."),
    ("Get Variables", &["no_decoration=False"], "Returns a dictionary containing all variables in the current scope."),
    ("Import Library", &["name", "*args"], "Imports a library with the given name and optional arguments."),
    ("Import Resource", &["path"], "Imports a resource file with the given path."),
    ("Import Variables", &["path", "*args"], "Imports a variable file with the given path and optional arguments."),
    ("Keyword Should Exist", &["name", "msg=None"], "Fails unless the given keyword exists in the current scope."),
    ("Length Should Be", &["item", "length", "msg=None"], "Verifies that the length of the given item is correct."),
    ("Log", &["message", "level=INFO", "html=False", "console=False", "repr=DEPRECATED", "formatter=str"], "Logs the given message with the given level.\n\nValid levels are TRACE, DEBUG, INFO (default), WARN and ERROR."),
    ("Log Many", &["*messages"], "Logs the given messages as separate entries using the INFO level."),
    ("Log To Console", &["message", "stream=STDOUT", "no_newline=False", "format="], "Logs the given message to the console."),
    ("Log Variables", &["level=INFO"], "Logs all variables in the current scope with given log level."),
    ("No Operation", &[], "Does absolutely nothing."),
    ("Pass Execution", &["message", "*tags"], "Skips rest of the current test, setup, or teardown with PASS status."),
    ("Pass Execution If", &["condition", "message", "*tags"], "Conditionally skips rest of the current test, setup, or teardown with PASS status."),
    ("Regexp Escape", &["*patterns"], "Returns each argument string escaped for use as a regular expression."),
    ("Reload Library", &["name_or_instance"], "Rechecks what keywords the specified library provides."),
    ("Remove Tags", &["*tags"], "Removes given tags from the current test or all tests in a suite."),
    ("Repeat Keyword", &["repeat", "name", "*args"], "Executes the specified keyword multiple times."),
    ("Replace Variables", &["text"], "Replaces variables in the given text with their current values."),
    ("Return From Keyword", &["*return_values"], "*DEPRECATED* Use the RETURN statement instead.\n\nReturns from the enclosing user keyword."),
    ("Return From Keyword If", &["condition", "*return_values"], "*DEPRECATED* Use IF and RETURN instead.\n\nReturns from the enclosing user keyword if condition is true."),
    ("Run Keyword", &["name", "*args"], "Executes the given keyword with the given arguments."),
    ("Run Keyword And Continue On Failure", &["name", "*args"], "Runs the keyword and continues execution even if a failure occurs."),
    ("Run Keyword And Expect Error", &["expected_error", "name", "*args"], "Runs the keyword and checks that the expected error occurred."),
    ("Run Keyword And Ignore Error", &["name", "*args"], "Runs the given keyword with the given arguments and ignores possible error."),
    ("Run Keyword And Return", &["name", "*args"], "Runs the specified keyword and returns from the enclosing user keyword."),
    ("Run Keyword And Return If", &["condition", "name", "*args"], "Runs the specified keyword and returns from the enclosing user keyword if condition is true."),
    ("Run Keyword And Return Status", &["name", "*args"], "Runs the given keyword with given arguments and returns the status as a Boolean value."),
    ("Run Keyword And Warn On Failure", &["name", "*args"], "Runs the specified keyword logs a warning if the keyword fails."),
    ("Run Keyword If", &["condition", "name", "*args"], "Runs the given keyword with the given arguments, if condition is true.\n\n`ELSE IF` and `ELSE` branches are supported."),
    ("Run Keyword If All Tests Passed", &["name", "*args"], "Runs the given keyword with the given arguments, if all tests passed."),
    ("Run Keyword If Any Tests Failed", &["name", "*args"], "Runs the given keyword with the given arguments, if one or more tests failed."),
    ("Run Keyword If Test Failed", &["name", "*args"], "Runs the given keyword with the given arguments, if the test failed."),
    ("Run Keyword If Test Passed", &["name", "*args"], "Runs the given keyword with the given arguments, if the test passed."),
    ("Run Keyword If Timeout Occurred", &["name", "*args"], "Runs the given keyword if either a test or a keyword timeout has occurred."),
    ("Run Keyword Unless", &["condition", "name", "*args"], "*DEPRECATED* Use IF instead.\n\nRuns the given keyword with the given arguments if condition is false."),
    ("Run Keywords", &["*keywords"], "Executes all the given keywords in a sequence.\n\nKeywords with arguments are separated with `AND`."),
    ("Set Global Variable", &["name", "*values"], "Makes a variable available globally in all tests and suites."),
    ("Set Library Search Order", &["*search_order"], "Sets the resolution order to use when a name matches multiple keywords."),
    ("Set Local Variable", &["name", "*values"], "Makes a variable available everywhere within the local scope."),
    ("Set Log Level", &["level"], "Sets the log threshold to the specified level and returns the old level."),
    ("Set Suite Documentation", &["doc", "append=False", "top=False"], "Sets documentation for the current test suite."),
    ("Set Suite Metadata", &["name", "value", "append=False", "top=False"], "Sets metadata for the current test suite."),
    ("Set Suite Variable", &["name", "*values", "children=False"], "Makes a variable available everywhere within the scope of the current suite."),
    ("Set Tags", &["*tags"], "Adds given tags for the current test or all tests in a suite."),
    ("Set Task Variable", &["name", "*values"], "Makes a variable available everywhere within the scope of the current task."),
    ("Set Test Documentation", &["doc", "append=False"], "Sets documentation for the current test case."),
    ("Set Test Message", &["message", "append=False"], "Sets message for the current test case."),
    ("Set Test Variable", &["name", "*values"], "Makes a variable available everywhere within the scope of the current test."),
    ("Set Variable", &["*values"], "Returns the given values which can then be assigned to a variables."),
    ("Set Variable If", &["condition", "*values"], "Sets variable based on the given condition."),
    ("Should Be Empty", &["item", "msg=None"], "Verifies that the given item is empty."),
    ("Should Be Equal", &["first", "second", "msg=None", "values=True", "ignore_case=False", "formatter=str", "strip_spaces=False", "collapse_spaces=False"], "Fails if the given objects are unequal."),
    ("Should Be Equal As Integers", &["first", "second", "msg=None", "values=True", "base=None"], "Fails if objects are unequal after converting them to integers."),
    ("Should Be Equal As Numbers", &["first", "second", "msg=None", "values=True", "precision=6"], "Fails if objects are unequal after converting them to real numbers."),
    ("Should Be Equal As Strings", &["first", "second", "msg=None", "values=True", "ignore_case=False", "strip_spaces=False", "formatter=str", "collapse_spaces=False"], "Fails if objects are unequal after converting them to strings."),
    ("Should Be True", &["condition", "msg=None"], "Fails if the given condition is not true."),
    ("Should Contain", &["container", "item", "msg=None", "values=True", "ignore_case=False", "strip_spaces=False", "collapse_spaces=False"], "Fails if container does not contain item one or more times."),
    ("Should Contain Any", &["container", "*items", "**configuration"], "Fails if container does not contain any of the *items."),
    ("Should Contain X Times", &["container", "item", "count", "msg=None", "ignore_case=False", "strip_spaces=False", "collapse_spaces=False"], "Fails if container does not contain item count times."),
    ("Should End With", &["str1", "str2", "msg=None", "values=True", "ignore_case=False", "strip_spaces=False", "collapse_spaces=False"], "Fails if the string str1 does not end with the string str2."),
    ("Should Match", &["string", "pattern", "msg=None", "values=True", "ignore_case=False"], "Fails if the given string does not match the given glob pattern."),
    ("Should Match Regexp", &["string", "pattern", "msg=None", "values=True", "flags=None"], "Fails if string does not match pattern as a regular expression."),
    ("Should Not Be Empty", &["item", "msg=None"], "Verifies that the given item is not empty."),
    ("Should Not Be Equal", &["first", "second", "msg=None", "values=True", "ignore_case=False", "strip_spaces=False", "collapse_spaces=False"], "Fails if the given objects are equal."),
    ("Should Not Be True", &["condition", "msg=None"], "Fails if the given condition is true."),
    ("Should Not Contain", &["container", "item", "msg=None", "values=True", "ignore_case=False", "strip_spaces=False", "collapse_spaces=False"], "Fails if container contains item one or more times."),
    ("Should Not Match", &["string", "pattern", "msg=None", "values=True", "ignore_case=False"], "Fails if the given string matches the given pattern."),
    ("Should Start With", &["str1", "str2", "msg=None", "values=True", "ignore_case=False", "strip_spaces=False", "collapse_spaces=False"], "Fails if the string str1 does not start with the string str2."),
    ("Skip", &["msg=Skipped with Skip keyword."], "Skips the rest of the current test."),
    ("Skip If", &["condition", "msg=None"], "Skips the rest of the current test if the condition is True."),
    ("Sleep", &["time_", "reason=None"], "Pauses the test executed for the given time."),
    ("Variable Should Exist", &["name", "msg=None"], "Fails unless the given variable exists within the current scope."),
    ("Variable Should Not Exist", &["name", "msg=None"], "Fails if the given variable exists within the current scope."),
    ("Wait Until Keyword Succeeds", &["retry", "retry_interval", "name", "*args"], "Runs the specified keyword and retries if it fails."),
];

/// `BuiltIn`, imported into every namespace.
#[derive(Debug)]
pub struct BuiltInLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for BuiltInLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltInLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(BUILTIN_LIBRARY_NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for BuiltInLibrary {
    fn name(&self) -> &str {
        BUILTIN_LIBRARY_NAME
    }

    fn description(&self) -> &str {
        "An always available standard library with often needed keywords."
    }

    fn scope(&self) -> LibraryScope {
        LibraryScope::Global
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
