//! Property-based tests for variables parsing.

#[cfg(test)]
mod proptest_tests {
    use crate::error::Error;
    use crate::variables::parse_entries;
    use proptest::prelude::*;
    use std::path::Path;

    // Field values never contain the delimiter, comment marker or line breaks.
    const FIELD: &str = "[A-Za-z0-9./_-]{1,16}";

    proptest! {
        /// Property: a well-formed two-field line yields exactly its two fields
        #[test]
        fn well_formed_line_yields_one_entry(a in FIELD, b in FIELD) {
            let content = format!("{};{}\n", a, b);
            let entries = parse_entries(&content, Path::new("v.txt"), 2).unwrap();
            prop_assert_eq!(entries.len(), 1);
            prop_assert_eq!(&entries[0].fields, &vec![a, b]);
        }

        /// Property: comment and blank lines never produce entries
        #[test]
        fn comments_and_blanks_produce_nothing(
            comments in prop::collection::vec("[ \t]*(#[^\n\r]*)?", 0..10)
        ) {
            let content = comments.join("\n");
            let entries = parse_entries(&content, Path::new("v.txt"), 2).unwrap();
            prop_assert!(entries.is_empty());
        }

        /// Property: entries keep file order, interleaved comments notwithstanding
        #[test]
        fn entries_keep_file_order(rows in prop::collection::vec((FIELD, FIELD), 1..20)) {
            let content: String = rows
                .iter()
                .map(|(a, b)| format!("# note\n{};{}\n\n", a, b))
                .collect();
            let entries = parse_entries(&content, Path::new("v.txt"), 2).unwrap();
            prop_assert_eq!(entries.len(), rows.len());
            for (entry, (a, b)) in entries.iter().zip(rows.iter()) {
                prop_assert_eq!(&entry.fields[0], a);
                prop_assert_eq!(&entry.fields[1], b);
            }
        }

        /// Property: a wrong field count anywhere rejects the whole file
        #[test]
        fn wrong_field_count_rejects_file(
            good in prop::collection::vec((FIELD, FIELD), 0..5),
            bad in prop::collection::vec(FIELD, 1..5)
                .prop_filter("must not have exactly two fields", |v| v.len() != 2),
        ) {
            let mut content: String = good.iter().map(|(a, b)| format!("{};{}\n", a, b)).collect();
            content.push_str(&bad.join(";"));
            content.push('\n');

            let result = parse_entries(&content, Path::new("v.txt"), 2);
            let is_validation = matches!(result, Err(Error::Validation { .. }));
            prop_assert!(is_validation);
            if let Err(Error::Validation { message, .. }) = result {
                let expected = format!("line {}", good.len() + 1);
                prop_assert!(message.contains(&expected));
            }
        }
    }
}
