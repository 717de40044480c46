use conductor_domain::Pipeline;

pub const PIPELINE_NAME_PLACEHOLDER: &str = "@{pipeline_name}";

const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Turns a configured storage table name into a Postgres identifier for one pipeline.
///
/// Placeholders are replaced with the pipeline's current values, then the result is
/// lower-cased, stripped of anything outside `[a-z0-9_]`, and cut to 63 characters.
/// Empty and missing values are returned as they are.
pub fn resolve_table_name(pipeline: &Pipeline, value: Option<&str>) -> Option<String> {
    let value = value?;

    if value.is_empty() {
        return Some(String::new());
    }

    let resolved = value.replace(PIPELINE_NAME_PLACEHOLDER, &pipeline.name);

    Some(sanitize(&resolved))
}

fn sanitize(raw: &str) -> String {
    let mut sanitized: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !sanitized.starts_with(|c: char| c.is_ascii_lowercase() || c == '_') {
        sanitized.insert(0, '_');
    }

    let mut collapsed = String::with_capacity(sanitized.len());
    for c in sanitized.chars() {
        if !(c == '_' && collapsed.ends_with('_')) {
            collapsed.push(c);
        }
    }

    if collapsed.ends_with('_') {
        collapsed.pop();
    }

    if collapsed.len() > MAX_IDENTIFIER_LENGTH {
        collapsed.truncate(MAX_IDENTIFIER_LENGTH);
        if collapsed.ends_with('_') {
            collapsed.pop();
        }
    }

    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(name: &str) -> Pipeline {
        Pipeline::new(1, name)
    }

    #[test]
    fn test_placeholder_is_replaced_and_lowercased() {
        assert_eq!(
            resolve_table_name(&pipeline("TestPipeline"), Some("@{pipeline_name}")),
            Some("testpipeline".to_string())
        );
        assert_eq!(
            resolve_table_name(&pipeline("TestPipeline"), Some("@{pipeline_name}#$%!")),
            Some("testpipeline".to_string())
        );
        assert_eq!(
            resolve_table_name(&pipeline("Orders EU"), Some("dbz_offsets_@{pipeline_name}")),
            Some("dbz_offsets_orders_eu".to_string())
        );
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(
            resolve_table_name(&pipeline("p"), Some("invalid!@name$")),
            Some("invalid_name".to_string())
        );
    }

    #[test]
    fn test_leading_digit_gets_underscore() {
        assert_eq!(
            resolve_table_name(&pipeline("p"), Some("1offsets")),
            Some("_1offsets".to_string())
        );
    }

    #[test]
    fn test_truncation() {
        let long = "a".repeat(70);
        let resolved = resolve_table_name(&pipeline("p"), Some(&long)).expect("resolved");

        assert_eq!(resolved.len(), 63);
        assert!(!resolved.ends_with('_'));

        let boundary = format!("{}_b", "a".repeat(62));
        let resolved = resolve_table_name(&pipeline("p"), Some(&boundary)).expect("resolved");
        assert_eq!(resolved, "a".repeat(62));
    }

    #[test]
    fn test_empty_and_missing() {
        assert_eq!(resolve_table_name(&pipeline("p"), None), None);
        assert_eq!(
            resolve_table_name(&pipeline("p"), Some("")),
            Some(String::new())
        );
    }

    #[test]
    fn test_idempotent() {
        for raw in [
            "@{pipeline_name}_offsets",
            "Schema--History!!",
            "9lives",
            "__x__",
            &"b_".repeat(40),
        ] {
            let p = pipeline("Some Pipeline");
            let once = resolve_table_name(&p, Some(raw)).expect("resolved");
            let twice = resolve_table_name(&p, Some(&once)).expect("resolved");
            assert_eq!(once, twice, "not idempotent for {raw}");
        }
    }
}
