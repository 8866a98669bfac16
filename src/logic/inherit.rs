use crate::logic::descriptor::{CloneRule, RootDescriptor};
use crate::model::{row::is_set_value, Id, Row};

/// Overlay the caller's partial row onto the source root.
///
/// Unset caller attributes listed as inheritable take the source's value; set
/// ones win. Clone rules run first. The result carries no id: identity is
/// always assigned fresh by the caller of this function.
pub fn merge(root: &RootDescriptor, source: &Row, partial: Row) -> Row {
    let mut merged = Row {
        id: Id::new(),
        attributes: partial
            .attributes
            .into_iter()
            .filter(|(_, value)| is_set_value(value))
            .collect(),
    };

    for rule in &root.rules {
        match rule {
            CloneRule::Force { attribute, value } => {
                merged.set(attribute, value.clone());
            }
            CloneRule::IncrementSuffix { attribute } => {
                if !merged.is_set(attribute) {
                    let next = increment_suffix(source.get_str(attribute).unwrap_or(""));
                    merged.set(attribute, next);
                }
            }
        }
    }

    for attribute in &root.inheritable {
        if merged.is_set(attribute) {
            continue;
        }
        if let Some(value) = source.get(attribute).filter(|v| !v.is_null()) {
            merged.set(attribute, value.clone());
        }
    }

    merged
}

/// `lofi` -> `lofi2`, `lofi9` -> `lofi10`, `` -> `2`
pub fn increment_suffix(value: &str) -> String {
    let digits_at = value
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    match digits_at {
        Some(i) => {
            let (stem, digits) = value.split_at(i);
            match digits.parse::<u64>() {
                Ok(n) => format!("{}{}", stem, n + 1),
                Err(_) => format!("{}2", value),
            }
        }
        None => format!("{}2", value),
    }
}

/// Attributes the caller explicitly set, by name
pub fn overridden(partial: &Row) -> Vec<&str> {
    partial
        .attributes
        .iter()
        .filter(|(_, v)| is_set_value(v))
        .map(|(k, _)| k.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::descriptor::SchemaDescriptor;
    use crate::model::EntityKind;
    use serde_json::json;

    fn source_program() -> Row {
        Row::new("p1")
            .with("library_id", "lib1")
            .with("type", "Main")
            .with("state", "Published")
            .with("name", "leaves")
            .with("key", "C#")
            .with("tempo", 120.0)
            .with("density", 0.6)
    }

    #[test]
    fn test_unset_attributes_inherit_from_source() {
        let descriptor = SchemaDescriptor::standard().unwrap();
        let root = descriptor.root(EntityKind::Program).unwrap();
        let partial = Row::partial()
            .with("name", "cannons fifty nine")
            .with("library_id", "lib2")
            .with("key", "");

        let merged = merge(root, &source_program(), partial);

        assert!(merged.id.is_empty());
        assert_eq!(merged.get_str("name"), Some("cannons fifty nine"));
        assert_eq!(merged.get_str("library_id"), Some("lib2"));
        // empty string counts as unset
        assert_eq!(merged.get_str("key"), Some("C#"));
        assert_eq!(merged.get_f64("tempo"), Some(120.0));
        assert_eq!(merged.get_str("type"), Some("Main"));
        assert_eq!(merged.get_f64("density"), Some(0.6));
        assert!(merged.get("config").is_none());
    }

    #[test]
    fn test_identity_is_never_inherited() {
        let descriptor = SchemaDescriptor::standard().unwrap();
        let root = descriptor.root(EntityKind::Program).unwrap();
        let mut partial = Row::partial();
        partial.id = "caller-picked".to_string();

        let merged = merge(root, &source_program(), partial);
        assert!(merged.id.is_empty());
    }

    #[test]
    fn test_template_rules() {
        let descriptor = SchemaDescriptor::standard().unwrap();
        let root = descriptor.root(EntityKind::Template).unwrap();
        let source = Row::new("t1")
            .with("account_id", "acct1")
            .with("name", "Lofi")
            .with("ship_key", "lofi9")
            .with("type", "Production");

        let merged = merge(root, &source, Row::partial().with("type", "Production"));
        assert_eq!(merged.get("type"), Some(&json!("Preview")));
        assert_eq!(merged.get_str("ship_key"), Some("lofi10"));
        assert_eq!(merged.get_str("name"), Some("Lofi"));

        let explicit = merge(root, &source, Row::partial().with("ship_key", "mine"));
        assert_eq!(explicit.get_str("ship_key"), Some("mine"));
    }

    #[test]
    fn test_increment_suffix() {
        assert_eq!(increment_suffix("lofi"), "lofi2");
        assert_eq!(increment_suffix("lofi9"), "lofi10");
        assert_eq!(increment_suffix("chill123"), "chill124");
        assert_eq!(increment_suffix(""), "2");
        assert_eq!(increment_suffix("42"), "43");
    }

    #[test]
    fn test_overridden_lists_set_attributes() {
        let partial = Row::partial().with("name", "x").with("key", "").with("tempo", 90);
        let mut names = overridden(&partial);
        names.sort();
        assert_eq!(names, vec!["name", "tempo"]);
    }
}
