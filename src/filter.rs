use crate::error::FilterError;
use crate::model::{BoolOp, Filter, FilterMatch};

/// Build the query filter from the discrete match flags and a custom
/// `<key>=<value>&<key>=<value>` string.
///
/// Clauses come out in a fixed order: trace ID, span ID, severity, then the
/// custom pairs in input order. Empty inputs add nothing.
pub fn build_filter(
    trace_id: Option<&str>,
    span_id: Option<&str>,
    severity: Option<&str>,
    custom: Option<&str>,
) -> Result<Filter, FilterError> {
    let mut matches = Vec::new();

    let discrete = [("traceID", trace_id), ("spanID", span_id), ("severity", severity)];
    for (key, value) in discrete {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            matches.push(FilterMatch::equals(key, value));
        }
    }

    if let Some(custom) = custom.filter(|c| !c.is_empty()) {
        matches.extend(parse_custom(custom)?);
    }

    Ok(Filter {
        op: BoolOp::And,
        matches,
    })
}

fn parse_custom(custom: &str) -> Result<Vec<FilterMatch>, FilterError> {
    custom
        .split('&')
        .map(|clause| {
            let parts: Vec<&str> = clause.split('=').collect();
            match parts.as_slice() {
                [key, value] => Ok(FilterMatch::equals(*key, *value)),
                _ => Err(FilterError::InvalidClause {
                    clause: clause.to_string(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(filter: &Filter) -> Vec<(&str, &str)> {
        filter
            .matches
            .iter()
            .map(|m| (m.key.as_str(), m.value.as_str()))
            .collect()
    }

    #[test]
    fn test_no_inputs_gives_empty_and() {
        let filter = build_filter(None, None, None, None).unwrap();
        assert_eq!(filter.op, BoolOp::And);
        assert!(filter.matches.is_empty());

        let filter = build_filter(Some(""), Some(""), Some(""), Some("")).unwrap();
        assert!(filter.matches.is_empty());
    }

    #[test]
    fn test_clause_order_is_deterministic() {
        let filter = build_filter(
            Some("trace-1"),
            Some("span-9"),
            Some("error"),
            Some("service=billing&region=eu"),
        )
        .unwrap();
        assert_eq!(
            keys(&filter),
            vec![
                ("traceID", "trace-1"),
                ("spanID", "span-9"),
                ("severity", "error"),
                ("service", "billing"),
                ("region", "eu"),
            ]
        );
    }

    #[test]
    fn test_only_present_fields_become_clauses() {
        let filter = build_filter(None, Some("span-9"), None, Some("a=1")).unwrap();
        assert_eq!(keys(&filter), vec![("spanID", "span-9"), ("a", "1")]);
    }

    #[test]
    fn test_clause_without_equals_is_rejected() {
        let err = build_filter(None, None, None, Some("a=1&b")).unwrap_err();
        assert_eq!(
            err,
            FilterError::InvalidClause {
                clause: "b".to_string()
            }
        );
    }

    #[test]
    fn test_clause_with_two_equals_is_rejected() {
        assert!(build_filter(None, None, None, Some("a=1=2")).is_err());
    }

    #[test]
    fn test_trailing_ampersand_is_rejected() {
        assert!(build_filter(Some("t"), None, None, Some("a=1&")).is_err());
    }
}
