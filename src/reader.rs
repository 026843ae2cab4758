//! Reader
//!
//! Loaders for C4.5 style data sets: a `.names` file declaring the class and
//! feature attributes, and a `.data` file holding one comma separated
//! instance per line with the class value last.
use crate::config::TreeConfig;
use crate::constants::DEFAULT_CLASS_NAME;
use crate::data::{Attribute, Instance, Schema, Value};
use crate::errors::DecisionTreeError;
use log::debug;
use std::fs;
use std::path::Path;

/// Strip surrounding whitespace and trailing periods, `None` for blank and comment lines.
fn clean_line(line: &str) -> Option<&str> {
    let line = line.trim().trim_end_matches('.').trim_end();
    if line.is_empty() || line.starts_with('|') {
        None
    } else {
        Some(line)
    }
}

/// Parse one declaration, `name: continuous` or `name: v1, v2, v3`. The name is optional.
fn parse_attribute(line: &str) -> Attribute {
    let (name, content) = match line.split_once(':') {
        Some((name, content)) => (name.trim(), content.trim()),
        None => ("", line),
    };
    if content == "continuous" {
        Attribute::continuous(name)
    } else {
        Attribute::nominal(name, content.split(',').map(str::trim))
    }
}

/// Parse the text of a `.names` file. The first declared attribute is the class.
pub fn parse_names(text: &str) -> Result<Schema, DecisionTreeError> {
    let mut class: Option<Attribute> = None;
    let mut features = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let Some(line) = clean_line(line) else {
            continue;
        };
        let attribute = parse_attribute(line);
        if class.is_none() {
            let mut attribute = attribute;
            if attribute.name.is_empty() {
                attribute.name = DEFAULT_CLASS_NAME.to_string();
            }
            class = Some(attribute);
        } else if attribute.name.is_empty() {
            return Err(DecisionTreeError::InvalidSchema(format!(
                "attribute on line {} does not have a name",
                line_no + 1
            )));
        } else {
            features.push(attribute);
        }
    }
    let class = class.ok_or_else(|| DecisionTreeError::InvalidSchema("no class attribute declared".to_string()))?;
    Schema::new(features, class)
}

/// Read a `.names` file.
pub fn read_names<P: AsRef<Path>>(path: P) -> Result<Schema, DecisionTreeError> {
    let text = fs::read_to_string(path).map_err(|e| DecisionTreeError::UnableToRead(e.to_string()))?;
    parse_names(&text)
}

fn parse_instance(schema: &Schema, line: &str, invalid_as_missing: bool) -> Result<Instance, DecisionTreeError> {
    let raw: Vec<&str> = line.split(',').collect();
    let n_features = schema.features().len();
    if raw.len() < n_features {
        return Err(DecisionTreeError::UnableToRead(format!(
            "insufficient data values, expected {}, got {}",
            n_features,
            raw.len()
        )));
    }
    let values = schema
        .features()
        .iter()
        .zip(raw.iter())
        .map(|(attribute, token)| attribute.parse(token, invalid_as_missing))
        .collect::<Result<Vec<Value>, DecisionTreeError>>()?;
    // A row without a trailing class value is unlabeled.
    let class = if raw.len() > n_features {
        schema.class().parse(raw[raw.len() - 1], invalid_as_missing)?
    } else {
        Value::Missing
    };
    Ok(Instance::new(values, class))
}

/// Parse the text of a `.data` file against `schema`.
///
/// * `schema` - Attributes the columns are read as, in order.
/// * `config` - `consider_invalid_data_as_missing` turns unparsable values into
///   missing values instead of failing the load.
pub fn parse_data(schema: &Schema, text: &str, config: &TreeConfig) -> Result<Vec<Instance>, DecisionTreeError> {
    let mut instances = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let Some(line) = clean_line(line) else {
            continue;
        };
        let instance =
            parse_instance(schema, line, config.consider_invalid_data_as_missing).map_err(|e| match e {
                DecisionTreeError::UnableToRead(msg) => {
                    DecisionTreeError::UnableToRead(format!("line {}: {}", line_no + 1, msg))
                }
                other => other,
            })?;
        instances.push(instance);
    }
    debug!("Read {} instances.", instances.len());
    Ok(instances)
}

/// Read a `.data` file against `schema`.
pub fn read_data<P: AsRef<Path>>(
    schema: &Schema,
    path: P,
    config: &TreeConfig,
) -> Result<Vec<Instance>, DecisionTreeError> {
    let text = fs::read_to_string(path).map_err(|e| DecisionTreeError::UnableToRead(e.to_string()))?;
    parse_data(schema, &text, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttributeKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const NAMES: &str = "| toy data set\n\
        \n\
        yes, no.\n\
        size: continuous.\n\
        shape: round, square.\n";

    #[test]
    fn test_parse_names() {
        let schema = parse_names(NAMES).unwrap();
        assert_eq!(schema.class().name, "Class");
        assert_eq!(schema.class_values(), ["yes", "no"]);
        assert_eq!(schema.features().len(), 2);
        assert!(schema.features()[0].is_continuous());
        assert_eq!(
            schema.features()[1].kind,
            AttributeKind::Nominal(vec!["round".to_string(), "square".to_string()])
        );
    }

    #[test]
    fn test_parse_names_errors() {
        assert!(matches!(
            parse_names("yes, no.\ncontinuous.\n"),
            Err(DecisionTreeError::InvalidSchema(_))
        ));
        assert!(matches!(
            parse_names("label: continuous.\n"),
            Err(DecisionTreeError::InvalidSchema(_))
        ));
        assert!(parse_names("| only a comment\n").is_err());
    }

    #[test]
    fn test_parse_data() {
        let schema = parse_names(NAMES).unwrap();
        let config = TreeConfig::default();
        let text = "1.5, round, yes.\n| comment\n\n?, square, no\n2, ?\n";
        let instances = parse_data(&schema, text, &config).unwrap();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].values, vec![Value::Numeric(1.5), "round".into()]);
        assert_eq!(instances[0].class_label(), Some("yes"));
        assert!(instances[1].values[0].is_missing());
        assert!(instances[2].values[1].is_missing());
        assert!(instances[2].class.is_missing());
    }

    #[test]
    fn test_parse_data_invalid_values() {
        let schema = parse_names(NAMES).unwrap();
        let strict = TreeConfig::default();
        match parse_data(&schema, "big, round, yes\n", &strict) {
            Err(DecisionTreeError::ParseValue(raw, attr, _)) => {
                assert_eq!(raw, "big");
                assert_eq!(attr, "size");
            }
            _ => panic!("expected a parse error"),
        }
        assert!(parse_data(&schema, "1, oval, yes\n", &strict).is_err());
        assert!(matches!(
            parse_data(&schema, "1\n", &strict),
            Err(DecisionTreeError::UnableToRead(_))
        ));

        let lenient = TreeConfig::default().set_consider_invalid_data_as_missing(true);
        let instances = parse_data(&schema, "big, oval, maybe\n", &lenient).unwrap();
        assert!(instances[0].values.iter().all(Value::is_missing));
        assert!(instances[0].class.is_missing());
    }

    #[test]
    fn test_read_files() {
        let mut names = NamedTempFile::new().unwrap();
        names.write_all(NAMES.as_bytes()).unwrap();
        let mut data = NamedTempFile::new().unwrap();
        data.write_all(b"3, square, no.\n").unwrap();

        let schema = read_names(names.path()).unwrap();
        let instances = read_data(&schema, data.path(), &TreeConfig::default()).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].class_label(), Some("no"));
        assert!(matches!(
            read_names("does/not/exist.names"),
            Err(DecisionTreeError::UnableToRead(_))
        ));
    }
}
