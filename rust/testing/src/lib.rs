// Fixtures shared by pocheck's integration tests.

/// A minimal but complete catalog: header plus a handful of translated,
/// untranslated and fuzzy entries, covering the states tests usually
/// need without each one hand-assembling a PO string.
pub fn sample_catalog() -> String {
    concat!(
        "msgid \"\"\n",
        "msgstr \"\"\n",
        "\"Project-Id-Version: pocheck-testing\\n\"\n",
        "\"Content-Type: text/plain; charset=UTF-8\\n\"\n",
        "\"Plural-Forms: nplurals=2; plural=(n != 1);\\n\"\n",
        "\n",
        "#: src/greet.c:3\n",
        "msgid \"Hello\"\n",
        "msgstr \"Hola\"\n",
        "\n",
        "#: src/greet.c:9\n",
        "msgid \"Goodbye\"\n",
        "msgstr \"\"\n",
        "\n",
        "#: src/count.c:1\n",
        "#, fuzzy\n",
        "msgid \"One file\"\n",
        "msgid_plural \"%d files\"\n",
        "msgstr[0] \"Un archivo\"\n",
        "msgstr[1] \"%d archivos\"\n",
    )
    .to_string()
}

/// A tiny rule file exercising a shorthand `msgstr` trigger with a
/// `valid` exception, for parser/matcher integration tests.
pub fn sample_rules() -> String {
    concat!(
        "[\\bteh\\b]i\n",
        "hint=\"common misspelling of 'the'\"\n",
        "valid msgctxt=\"proper-noun-context\"\n",
    )
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_catalog_parses() {
        let catalog = pocheck::pofile(&sample_catalog()).unwrap();
        assert_eq!(catalog.len(), 3);
    }
}
