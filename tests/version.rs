#[cfg(test)]
mod tests {
    use sqlevo::libs::version::Version;

    fn v(label: &str) -> Version {
        Version::parse(label).unwrap()
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        for label in ["1", "1.2", "2.0.13", "10.0"] {
            assert_eq!(v(label).to_string(), label);
        }
    }

    #[test]
    fn test_ordering_is_lexicographic_by_component() {
        assert!(v("1") < v("2"));
        assert!(v("1.2") < v("1.10"));
        assert!(v("2") < v("10"));
        assert!(v("1") < v("1.0"));
        assert_eq!(v("1.2.3"), v("1.2.3"));
    }

    #[test]
    fn test_sentinels_bound_all_labels() {
        assert!(Version::Min < v("0"));
        assert!(v("999999.999999") < Version::Max);
        assert!(Version::Min < Version::Max);
    }

    #[test]
    fn test_sentinel_spellings_round_trip() {
        assert_eq!(v("<min>"), Version::Min);
        assert_eq!(v("<max>"), Version::Max);
        assert_eq!(Version::Min.to_string(), "<min>");
    }

    #[test]
    fn test_invalid_labels_are_rejected() {
        for label in ["", "a", "1.a", "1..2", "-1", "1.2."] {
            assert!(Version::parse(label).is_err(), "parsed '{}'", label);
        }
    }

    #[test]
    fn test_max_of_labels_matches_ordering() {
        let mut versions = vec![v("2"), v("10"), v("1.9.9")];
        versions.sort();
        assert_eq!(versions.last().unwrap().to_string(), "10");
    }
}
