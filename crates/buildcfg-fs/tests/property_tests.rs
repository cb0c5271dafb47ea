use buildcfg_fs::NormalizedPath;
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalization_is_idempotent(s in "[a-z./\\\\]{0,24}") {
        let once = NormalizedPath::new(&s);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalized_paths_have_no_backslashes_or_empty_segments(s in "\\PC{0,32}") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));
        prop_assert!(!path.as_str().contains("//"));
    }

    #[test]
    fn every_ancestor_is_a_prefix(segments in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
        let path = NormalizedPath::new(format!("/{}", segments.join("/")));
        for ancestor in path.ancestors() {
            prop_assert!(path.starts_with(&ancestor));
        }
    }
}
