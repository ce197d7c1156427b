//! Loading a configuration document from disk, and the replication wire
//! format as another server would send it.

use std::io::Write;

use custom_tags_core::{DecodedTags, Settings, TagStore, TagsConfig};

#[test]
fn config_file_with_json5_syntax_builds_settings() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        "\u{feff}{{\n  specialmsg: [\n    {{ command: 'privmsg', index: 0 }},\n    \
         {{ command: '311', index: 1 }},\n    {{ command: '311', index: 2 }},\n  ],\n  \
         customtags: {{ vendor: 'acme' }},\n}}\n"
    )
    .expect("write");

    let config = TagsConfig::from_file(file.path()).expect("config");
    let settings = Settings::build(&config, "irc.example.net").expect("settings");
    assert_eq!(settings.vendor, "acme");
    assert_eq!(settings.index.position("PRIVMSG"), Some(0));
    assert_eq!(settings.index.position("311"), Some(2));
    assert_eq!(settings.index.len(), 2);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = TagsConfig::from_file(&dir.path().join("absent.json")).expect_err("missing");
    assert_eq!(err.error_type(), "OS_ERROR");
}

#[test]
fn unparseable_config_reports_both_parsers() {
    let err = TagsConfig::parse("{ specialmsg: [").expect_err("broken");
    assert!(err.is_configuration());
    assert_eq!(err.error_type(), "CONFIGURATION_ERROR");
}

#[test]
fn empty_vendor_falls_back_to_server_name() {
    let config = TagsConfig::parse(r#"{"customtags":{"vendor":""}}"#).expect("config");
    let settings = Settings::build(&config, "irc.example.net").expect("settings");
    assert_eq!(settings.vendor, "irc.example.net");
    assert!(settings.index.is_empty());
}

#[test]
fn wire_values_from_a_peer() {
    let cases: Vec<(&str, Option<Vec<(&str, &str)>>)> = vec![
        ("level 5 clan red", Some(vec![("level", "5"), ("clan", "red")])),
        ("note  level 5", Some(vec![("note", ""), ("level", "5")])),
        ("Level 5 LEVEL 6", Some(vec![("Level", "5")])),
        ("", None),
    ];
    for (raw, expected) in &cases {
        let decoded = TagStore::decode(raw).expect("well-formed");
        match (decoded, expected) {
            (DecodedTags::Present(store), Some(pairs)) => {
                let got: Vec<(&str, &str)> = store.iter().collect();
                assert_eq!(&got, pairs, "decoding {raw:?}");
            }
            (DecodedTags::Cleared, None) => {}
            (other, _) => panic!("unexpected decode of {raw:?}: {other:?}"),
        }
    }
}

#[test]
fn malformed_wire_values_are_rejected() {
    for raw in [
        "foo bar baz",
        " level 5",
        "level 5 ",
        "level",
        "lev\rel 5",
        "level 5\n",
        "le\tvel 5",
        "clan r\u{a0}ed",
    ] {
        let err = TagStore::decode(raw).expect_err(raw);
        assert_eq!(err.error_type(), "MALFORMED_PAYLOAD", "{raw:?}");
    }
}
