//! Built-in transform definitions, one per upstream CSV shape.

pub mod conexiones;
pub mod metrics;
pub mod programadas;
pub mod rq;
pub mod topes;

use super::dsl::Schema;

/// Schemas of every built-in transform
pub fn builtin() -> Vec<Schema> {
    vec![
        rq::schema(),
        conexiones::schema(),
        metrics::schema(),
        programadas::schema(),
        topes::schema(),
    ]
}

/// Parse CSV text and run a schema on it.
#[cfg(test)]
pub(crate) fn run_str(
    schema: &Schema,
    content: &str,
) -> crate::error::TransformResult<super::dsl::Execution> {
    let records = crate::parser::parse_str(content).map_err(crate::error::TransformError::Csv)?;
    let table = super::dsl::load_table(schema, records, "test.csv")?;
    Ok(super::dsl::execute(schema, table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_names_unique() {
        let schemas = builtin();
        let mut seen = HashSet::new();
        for schema in &schemas {
            for name in schema.names() {
                assert!(seen.insert(name.to_lowercase()), "duplicate name {}", name);
            }
        }
        assert_eq!(schemas.len(), 5);
    }

    #[test]
    fn test_schemas_serialize() {
        for schema in builtin() {
            assert!(schema.to_json().is_ok(), "{} does not serialize", schema.name);
        }
    }
}
