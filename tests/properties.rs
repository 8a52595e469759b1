use csv_schema_rename::{
    ConvertOptions, HeaderSchema, convert_csv, date_format::DEFAULT_DATE_LAYOUT,
    parse_date_format,
};
use proptest::prelude::*;

fn replace_first(haystack: &str, from: &str, to: &str) -> String {
    haystack.replacen(from, to, 1)
}

proptest! {
    #[test]
    fn date_layout_substitutes_each_placeholder_once(pattern in "[A-Za-z/:-]{1,16}") {
        let expected = replace_first(
            &replace_first(&replace_first(&pattern, "YYYY", "%Y"), "MM", "%m"),
            "DD",
            "%d",
        );
        let token = format!("DATE({pattern})");
        prop_assert_eq!(parse_date_format(&token), expected);
    }

    #[test]
    fn tokens_without_date_brackets_use_default_layout(token in "[a-z0-9 ]{0,12}") {
        prop_assert_eq!(parse_date_format(&token), DEFAULT_DATE_LAYOUT);
    }

    #[test]
    fn schema_entry_present_iff_name_non_empty(
        records in proptest::collection::vec(
            ("[a-z]{1,6}", "[A-Z]{0,3}", proptest::option::of("[A-Z()]{0,8}")),
            1..8,
        )
    ) {
        let mut text = String::new();
        for (original, name, column_type) in &records {
            text.push_str(original);
            text.push(',');
            text.push_str(name);
            if let Some(column_type) = column_type {
                text.push(',');
                text.push_str(column_type);
            }
            text.push('\n');
        }
        let schema = HeaderSchema::from_reader(text.as_bytes(), b',').expect("schema");
        for (original, name, column_type) in &records {
            if records.iter().filter(|(other, _, _)| other == original).count() > 1 {
                continue;
            }
            match schema.get(original) {
                Some(entry) => {
                    prop_assert!(!name.is_empty());
                    prop_assert_eq!(&entry.name, name);
                    prop_assert_eq!(&entry.column_type, column_type.as_deref().unwrap_or(""));
                }
                None => prop_assert!(name.is_empty()),
            }
        }
    }

    #[test]
    fn empty_schema_round_trips(
        rows in proptest::collection::vec(proptest::collection::vec("[a-z0-9]{1,5}", 3), 0..6)
    ) {
        let mut input = String::from("a,b,c\n");
        for row in &rows {
            input.push_str(&row.join(","));
            input.push('\n');
        }
        let mut output = Vec::new();
        convert_csv(
            input.as_bytes(),
            &mut output,
            &HeaderSchema::new(),
            &ConvertOptions::default(),
        )
        .expect("convert");
        prop_assert_eq!(String::from_utf8(output).unwrap(), input);
    }
}
