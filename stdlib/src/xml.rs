use robotls_core::library::{KeywordDoc, StdLibrary};

use crate::{initializer, keywords_from_table, KeywordSpec};

const NAME: &str = "XML";

const KEYWORDS: &[KeywordSpec] = &[
    ("Add Element", &["source", "element", "index=None", "xpath=."], "Adds a child element to the specified element."),
    ("Clear Element", &["source", "xpath=.", "clear_tail=False"], "Clears the contents of the specified element."),
    ("Copy Element", &["source", "xpath=."], "Returns a copy of the specified element."),
    ("Element Attribute Should Be", &["source", "name", "expected", "xpath=.", "message=None"], "Verifies that the specified attribute is expected."),
    ("Element Should Exist", &["source", "xpath=.", "message=None"], "Verifies that one or more element match the given xpath."),
    ("Element Should Not Exist", &["source", "xpath=.", "message=None"], "Verifies that no element match the given xpath."),
    ("Element Text Should Be", &["source", "expected", "xpath=.", "normalize_whitespace=False", "message=None"], "Verifies that the text of the specified element is expected."),
    ("Elements Should Be Equal", &["source", "expected", "exclude_children=False", "normalize_whitespace=False", "sort_children=False"], "Verifies that the given source element is equal to expected."),
    ("Evaluate Xpath", &["source", "expression", "context=."], "Evaluates the given xpath expression and returns results."),
    ("Get Child Elements", &["source", "xpath=."], "Returns the child elements of the specified element as a list."),
    ("Get Element", &["source", "xpath=."], "Returns an element in the source matching the xpath."),
    ("Get Element Attribute", &["source", "name", "xpath=.", "default=None"], "Returns the named attribute of the specified element."),
    ("Get Element Count", &["source", "xpath=."], "Returns and logs how many elements the given xpath matches."),
    ("Get Element Text", &["source", "xpath=.", "normalize_whitespace=False"], "Returns all text of the element, possibly whitespace normalized."),
    ("Get Elements", &["source", "xpath"], "Returns a list of elements in the source matching the xpath."),
    ("Log Element", &["source", "level=INFO", "xpath=."], "Logs the string representation of the specified element."),
    ("Parse Xml", &["source", "keep_clark_notation=False", "strip_namespaces=False"], "Parses the given XML file or string into an element structure."),
    ("Remove Element", &["source", "xpath=", "remove_tail=False"], "Removes the element matching xpath from the source structure."),
    ("Save Xml", &["source", "path", "encoding=UTF-8"], "Saves the given element to the specified file."),
    ("Set Element Attribute", &["source", "name", "value", "xpath=."], "Sets attribute name of the specified element to value."),
    ("Set Element Text", &["source", "text=None", "tail=None", "xpath=."], "Sets text and/or tail text of the specified element."),
];

/// `XML`: parsing, verifying and modifying XML documents.
#[derive(Debug)]
pub struct XmlLibrary {
    keywords: Vec<KeywordDoc>,
}

impl Default for XmlLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlLibrary {
    pub fn new() -> Self {
        Self {
            keywords: keywords_from_table(NAME, KEYWORDS),
        }
    }
}

impl StdLibrary for XmlLibrary {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "A library for verifying and modifying XML documents."
    }

    fn keywords(&self) -> Vec<KeywordDoc> {
        self.keywords.clone()
    }

    fn inits(&self) -> Vec<KeywordDoc> {
        vec![initializer(NAME, &["use_lxml=False"], "Import library with optionally lxml mode enabled.")]
    }
}
