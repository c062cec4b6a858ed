use robotls_core::library::{KeywordDoc, LibraryScope, StdLibrary};

use crate::{keywords_from_table, KeywordSpec};

const NAME: &str = "Collections";

const KEYWORDS: &[KeywordSpec] = &[
    ("Append To List", &["list_", "*values"], "Adds values to the end of list."),
    ("Combine Lists", &["*lists"], "Combines the given lists together and returns the result."),
    ("Convert To Dictionary", &["item"], "Converts the given item to a Python dict type."),
    ("Convert To List", &["item"], "Converts the given item to a Python list type."),
    ("Copy Dictionary", &["dictionary", "deepcopy=False"], "Returns a copy of the given dictionary."),
    ("Copy List", &["list_", "deepcopy=False"], "Returns a copy of the given list."),
    ("Count Values In List", &["list_", "value", "start=0", "end=None"], "Returns the number of occurrences of the given value in list."),
    ("Dictionaries Should Be Equal", &["dict1", "dict2", "msg=None", "values=True", "ignore_keys=None", "ignore_case=False"], "Fails if the given dictionaries are not equal."),
    ("Dictionary Should Contain Item", &["dictionary", "key", "value", "msg=None", "ignore_case=False"], "An item of key / value must be found in a dictionary."),
    ("Dictionary Should Contain Key", &["dictionary", "key", "msg=None", "ignore_case=False"], "Fails if key is not found from dictionary."),
    ("Dictionary Should Contain Sub Dictionary", &["dict1", "dict2", "msg=None", "values=True", "ignore_case=False"], "Fails unless all items in dict2 are found from dict1."),
    ("Dictionary Should Contain Value", &["dictionary", "value", "msg=None", "ignore_case=False"], "Fails if value is not found from dictionary."),
    ("Dictionary Should Not Contain Key", &["dictionary", "key", "msg=None", "ignore_case=False"], "Fails if key is found from dictionary."),
    ("Dictionary Should Not Contain Value", &["dictionary", "value", "msg=None", "ignore_case=False"], "Fails if value is found from dictionary."),
    ("Get Dictionary Items", &["dictionary", "sort_keys=True"], "Returns items of the given dictionary as a list."),
    ("Get Dictionary Keys", &["dictionary", "sort_keys=True"], "Returns keys of the given dictionary as a list."),
    ("Get Dictionary Values", &["dictionary", "sort_keys=True"], "Returns values of the given dictionary as a list."),
    ("Get From Dictionary", &["dictionary", "key", "default="], "Returns a value from the given dictionary based on the given key."),
    ("Get From List", &["list_", "index"], "Returns the value specified with an index from list."),
    ("Get Index From List", &["list_", "value", "start=0", "end=None"], "Returns the index of the first occurrence of the value on the list."),
    ("Get Match Count", &["list", "pattern", "case_insensitive=False", "whitespace_insensitive=False"], "Returns the count of matches to pattern in list."),
    ("Get Matches", &["list", "pattern", "case_insensitive=False", "whitespace_insensitive=False"], "Returns a list of matches to pattern in list."),
    ("Get Slice From List", &["list_", "start=0", "end=None"], "Returns a slice of the given list between start and end indexes."),
    ("Insert Into List", &["list_", "index", "value"], "Inserts value into list to the position specified with index."),
    ("Keep In Dictionary", &["dictionary", "*keys"], "Keeps the given keys in the dictionary and removes all other."),
    ("List Should Contain Sub List", &["list1", "list2", "msg=None", "values=True", "ignore_case=False"], "Fails if not all elements in list2 are found in list1."),
    ("List Should Contain Value", &["list_", "value", "msg=None", "ignore_case=False"], "Fails if the value is not found from list."),
    ("List Should Not Contain Duplicates", &["list_", "msg=None", "ignore_case=False"], "Fails if any element in the list is found from it more than once."),
    ("List Should Not Contain Value", &["list_", "value", "msg=None", "ignore_case=False"], "Fails if the value is found from list."),
    ("Lists Should Be Equal", &["list1", "list2", "msg=None", "values=True", "names=None", "ignore_order=False", "ignore_case=False"], "Fails if given lists are unequal."),
    ("Log Dictionary", &["dictionary", "level=INFO"], "Logs the size and contents of the dictionary using given level."),
    ("Log List", &["list_", "level=INFO"], "Logs the length and contents of the list using given level."),
    ("Pop From Dictionary", &["dictionary", "key", "default="], "Pops the given key from the dictionary and returns its value."),
    ("Remove Duplicates", &["list_"], "Returns a list without duplicates based on the given list."),
    ("Remove From Dictionary", &["dictionary", "*keys"], "Removes the given keys from the dictionary."),
    ("Remove From List", &["list_", "index"], "Removes and returns the value specified with an index from list."),
    ("Remove Values From List", &["list_", "*values"], "Removes all occurrences of given values from list."),
    ("Reverse List", &["list_"], "Reverses the given list in place."),
    ("Set List Value", &["list_", "index", "value"], "Sets the value of list specified by index to the given value."),
    ("Set To Dictionary", &["dictionary", "*key_value_pairs", "**items"], "Adds the given key_value_pairs and items to the dictionary."),
    ("Should Contain Match", &["list", "pattern", "msg=None", "case_insensitive=False", "whitespace_insensitive=False"], "Fails if pattern is not found in list."),
    ("Should Not Contain Match", &["list", "pattern", "msg=None", "case_insensitive=False", "whitespace_insensitive=False"], "Fails if pattern is found in list."),
    ("Sort List", &["list_"], "Sorts the given list in place in ascending order."),
];

/// `Collections`: keywords for lists and dictionaries.
#[derive(Debug)]
pub struct CollectionsLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for CollectionsLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionsLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for CollectionsLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library providing keywords for handling lists and dictionaries."
    }

    fn scope(&self) -> LibraryScope {
        LibraryScope::Global
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }
}
