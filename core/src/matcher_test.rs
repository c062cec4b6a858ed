#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use crate::matcher::{normalize, normalize_namespace, KeywordMatcher, VariableMatcher};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut h = DefaultHasher::new();
        value.hash(&mut h);
        h.finish()
    }

    #[test]
    fn normalize_drops_case_spaces_and_underscores() {
        assert_eq!(normalize("Open  Browser"), "openbrowser");
        assert_eq!(normalize("open_browser"), "openbrowser");
        assert_eq!(normalize_namespace(r"libs\My Lib"), "libs/mylib");
    }

    #[test]
    fn plain_matchers_compare_by_normalized_name() {
        let a = KeywordMatcher::new("Open Browser");
        let b = KeywordMatcher::new("open_browser");
        let c = KeywordMatcher::new("OPENBROWSER");
        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(b, c);
        assert_eq!(a, c);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(a.matches("openBrowser"));
        assert!(!a.matches("Open Browsers"));
    }

    #[test]
    fn embedded_matcher_matches_call_text() {
        let kw = KeywordMatcher::new(r#"User "${name}" logs in"#);
        assert!(kw.is_embedded());
        assert!(kw.matches(r#"User "alice" logs in"#));
        assert!(kw.matches(r#"user "Bob" LOGS IN"#));
        assert!(!kw.matches(r#"User alice logs in"#));

        let call = KeywordMatcher::new(r#"User "admin" logs in"#);
        assert_eq!(kw, call);
        assert_eq!(call, kw);
    }

    #[test]
    fn embedded_matcher_supports_custom_patterns() {
        let kw = KeywordMatcher::new(r"Add ${count:\d+} items");
        assert!(kw.matches("Add 12 items"));
        assert!(!kw.matches("Add many items"));
        let embedded = kw.embedded_arguments().unwrap();
        assert_eq!(embedded.names, vec!["count".to_string()]);
        assert_eq!(embedded.match_arguments("Add 7 items"), Some(vec!["7".to_string()]));
    }

    #[test]
    fn namespace_matcher_never_embeds() {
        let ns = KeywordMatcher::namespace("${lib}");
        assert!(!ns.is_embedded());
        assert!(ns.matches("${LIB}"));
    }

    #[test]
    fn variable_matcher_ignores_assign_mark_and_case() {
        let a = VariableMatcher::new("${My Var}=").unwrap();
        let b = VariableMatcher::new("${my_var}").unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.name, "${My Var}");
        assert!(a.matches("@{MYVAR}"));
        assert!(VariableMatcher::new("not a var").is_none());
        assert!(VariableMatcher::new("${a} ${b}").is_none());
    }

    #[test]
    fn environment_matcher_exposes_default() {
        let env = VariableMatcher::new("%{HOME=/tmp}").unwrap();
        assert!(env.is_environment());
        assert_eq!(env.base, "HOME");
        assert_eq!(env.default_value.as_deref(), Some("/tmp"));
    }
}
