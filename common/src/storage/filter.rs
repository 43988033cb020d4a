use serde::Serialize;

/// A scalar a `Filter` compares a field against. Kept narrow (no nested
/// objects) since every filterable field on `chunk` is a scalar or an
/// optional scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Str(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Str(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

/// A single constraint on a `chunk` field, compiled into a bound-parameter
/// `WHERE` clause fragment — never string-interpolated into the query
/// text, so arbitrary field values (including ones containing quotes) are
/// safe to pass straight through.
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, FilterValue),
    AnyOf(String, Vec<FilterValue>),
    Range(String, Option<FilterValue>, Option<FilterValue>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    One(FilterValue),
    Many(Vec<FilterValue>),
}

pub struct CompiledFilter {
    /// The `AND`-joined boolean expression, referencing `$f0`, `$f1`, ...
    pub clause: String,
    pub bindings: Vec<(String, BoundValue)>,
}

/// Compile a set of filters into a single bound-parameter `WHERE` clause.
/// An empty filter set compiles to the literal `true`.
pub fn compile(filters: &[Filter]) -> CompiledFilter {
    let mut clauses = Vec::with_capacity(filters.len());
    let mut bindings = Vec::new();

    for (i, filter) in filters.iter().enumerate() {
        match filter {
            Filter::Eq(field, value) => {
                let name = format!("f{i}");
                clauses.push(format!("{field} = ${name}"));
                bindings.push((name, BoundValue::One(value.clone())));
            }
            Filter::AnyOf(field, values) => {
                let name = format!("f{i}");
                clauses.push(format!("{field} IN ${name}"));
                bindings.push((name, BoundValue::Many(values.clone())));
            }
            Filter::Range(field, lo, hi) => {
                if let Some(lo) = lo {
                    let name = format!("f{i}lo");
                    clauses.push(format!("{field} >= ${name}"));
                    bindings.push((name, BoundValue::One(lo.clone())));
                }
                if let Some(hi) = hi {
                    let name = format!("f{i}hi");
                    clauses.push(format!("{field} <= ${name}"));
                    bindings.push((name, BoundValue::One(hi.clone())));
                }
            }
        }
    }

    let clause = if clauses.is_empty() {
        "true".to_string()
    } else {
        clauses.join(" AND ")
    };

    CompiledFilter { clause, bindings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_compile_to_true() {
        let compiled = compile(&[]);
        assert_eq!(compiled.clause, "true");
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn eq_and_anyof_and_range_join_with_and() {
        let filters = vec![
            Filter::Eq("user_id".into(), FilterValue::Str("u1".into())),
            Filter::AnyOf(
                "source_type".into(),
                vec![FilterValue::Str("message".into())],
            ),
            Filter::Range("score".into(), Some(FilterValue::Float(0.5)), None),
        ];
        let compiled = compile(&filters);
        assert_eq!(
            compiled.clause,
            "user_id = $f0 AND source_type IN $f1 AND score >= $f2lo"
        );
        assert_eq!(compiled.bindings.len(), 3);
    }

    #[test]
    fn range_with_no_bounds_produces_no_clause() {
        let filters = vec![Filter::Range("score".into(), None, None)];
        let compiled = compile(&filters);
        assert_eq!(compiled.clause, "true");
    }
}
