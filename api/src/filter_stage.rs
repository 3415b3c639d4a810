//! Decides when filtering applies to a request and runs the engine.
//!
//! Write-oriented methods carry a request body, not filter parameters,
//! so they bypass filtering entirely; for everything else the configured
//! query parameter is compiled and applied to the collection. A failed
//! compilation never reaches the collection layer.

use std::collections::HashSet;

use filter_expr::{compile_filter_with, Limits};
use poem::http::Method;
use thiserror::Error;

use crate::collection::Filterable;

/// The request-side surface the stage needs: an HTTP-style method and
/// named string parameters.
///
/// A parameter that is present but cannot be decoded is an error, never
/// `None`; conflating the two would hand back unfiltered data to a
/// caller who asked for a filter.
pub trait RequestContext {
    fn method(&self) -> &Method;
    fn query_param(&self, name: &str) -> Result<Option<String>, ParamDecodeError>;
}

/// A query parameter whose value is not valid percent-encoded UTF-8.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("query parameter `{0}` is not valid percent-encoded UTF-8")]
pub struct ParamDecodeError(pub String);

impl RequestContext for poem::Request {
    fn method(&self) -> &Method {
        poem::Request::method(self)
    }

    fn query_param(&self, name: &str) -> Result<Option<String>, ParamDecodeError> {
        let Some(query) = self.uri().query() else {
            return Ok(None);
        };
        for pair in query.split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            // An undecodable key can never equal a valid UTF-8
            // parameter name, so it is skipped, not reported.
            let Ok(key) = urlencoding::decode(key) else {
                continue;
            };
            if key == name {
                // '+' means space in query strings; decode it before
                // percent-decoding so %2B still comes through as '+'.
                let value = value.replace('+', " ");
                return match urlencoding::decode(&value) {
                    Ok(decoded) => Ok(Some(decoded.into_owned())),
                    Err(_) => Err(ParamDecodeError(name.to_string())),
                };
            }
        }
        Ok(None)
    }
}

/// Per-route filtering configuration: the query parameter carrying the
/// filter expression, the methods that bypass filtering, and input
/// limits.
#[derive(Debug, Clone)]
pub struct FilterStage {
    param: String,
    bypass_methods: HashSet<Method>,
    limits: Limits,
}

impl Default for FilterStage {
    fn default() -> Self {
        Self {
            param: "filter".to_string(),
            bypass_methods: HashSet::from([
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ]),
            limits: Limits::default(),
        }
    }
}

impl FilterStage {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            ..Self::default()
        }
    }

    pub fn with_bypass_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.bypass_methods = methods.into_iter().collect();
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Applies the request's filter expression to `collection`.
    ///
    /// Bypassed methods and absent or blank parameters leave the
    /// collection untouched; in those cases the raw string is never
    /// lexed. An undecodable parameter value is rejected, not ignored.
    pub fn apply<C: Filterable>(
        &self,
        request: &impl RequestContext,
        collection: C,
    ) -> Result<C, FilterRejection> {
        if self.bypass_methods.contains(request.method()) {
            return Ok(collection);
        }
        let raw = match request.query_param(&self.param) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(collection),
            Err(err) => {
                return Err(FilterRejection::Invalid {
                    stage: "decode",
                    position: None,
                    message: err.to_string(),
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(collection);
        }
        match compile_filter_with(&raw, &self.limits) {
            Ok(tree) => {
                tracing::debug!(filter = %raw, "compiled filter expression");
                Ok(collection.apply_predicate(&tree))
            }
            Err(err) if err.is_client_fault() => Err(FilterRejection::Invalid {
                stage: err.stage(),
                position: err.position(),
                message: err.to_string(),
            }),
            Err(err) => {
                tracing::error!(filter = %raw, error = %err, "internal fault while compiling filter");
                Err(FilterRejection::Internal)
            }
        }
    }
}

/// Client-visible outcome of a failed filter compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterRejection {
    #[error("invalid filter expression ({stage}): {message}")]
    Invalid {
        stage: &'static str,
        position: Option<usize>,
        message: String,
    },
    #[error("internal error while compiling filter expression")]
    Internal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MemoryCollection;
    use serde_json::json;

    struct TestRequest {
        method: Method,
        params: Vec<(String, String)>,
    }

    impl TestRequest {
        fn new(method: Method, params: &[(&str, &str)]) -> Self {
            Self {
                method,
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl RequestContext for TestRequest {
        fn method(&self) -> &Method {
            &self.method
        }

        fn query_param(&self, name: &str) -> Result<Option<String>, ParamDecodeError> {
            Ok(self
                .params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()))
        }
    }

    fn sample() -> MemoryCollection {
        MemoryCollection::new(vec![
            json!({"status": "active", "amount": 250}),
            json!({"status": "closed", "amount": 40}),
        ])
    }

    #[test]
    fn test_bypassed_method_skips_filtering() {
        let stage = FilterStage::default();
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let request = TestRequest::new(method, &[("filter", "%%%not a filter%%%")]);
            let result = stage.apply(&request, sample()).unwrap();
            assert_eq!(result.len(), 2);
        }
    }

    #[test]
    fn test_absent_parameter_leaves_collection_unchanged() {
        let stage = FilterStage::default();
        let request = TestRequest::new(Method::GET, &[("other", "x")]);
        assert_eq!(stage.apply(&request, sample()).unwrap().len(), 2);
    }

    #[test]
    fn test_blank_parameter_leaves_collection_unchanged() {
        let stage = FilterStage::default();
        let request = TestRequest::new(Method::GET, &[("filter", "   ")]);
        assert_eq!(stage.apply(&request, sample()).unwrap().len(), 2);
    }

    #[test]
    fn test_valid_filter_narrows_collection() {
        let stage = FilterStage::default();
        let request = TestRequest::new(Method::GET, &[("filter", "status.eq.active")]);
        let result = stage.apply(&request, sample()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0]["status"], "active");
    }

    #[test]
    fn test_invalid_filter_is_rejected_with_position() {
        let stage = FilterStage::default();
        let request = TestRequest::new(Method::GET, &[("filter", "(status.eq.active")]);
        let rejection = stage.apply(&request, sample()).unwrap_err();
        match rejection {
            FilterRejection::Invalid {
                stage, position, ..
            } => {
                assert_eq!(stage, "parse");
                assert_eq!(position, Some(0));
            }
            other => panic!("expected a validation rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_filter_is_rejected_at_the_limit_stage() {
        let stage = FilterStage::default();
        let long = "a".repeat(4096);
        let request = TestRequest::new(Method::GET, &[("filter", long.as_str())]);
        let rejection = stage.apply(&request, sample()).unwrap_err();
        assert!(matches!(
            rejection,
            FilterRejection::Invalid { stage: "limit", .. }
        ));
    }

    #[test]
    fn test_custom_parameter_name() {
        let stage = FilterStage::new("q");
        let request = TestRequest::new(Method::GET, &[("q", "amount.gte.100")]);
        assert_eq!(stage.apply(&request, sample()).unwrap().len(), 1);
    }

    #[test]
    fn test_poem_request_query_decoding() {
        let stage = FilterStage::default();
        let request = poem::Request::builder()
            .method(Method::GET)
            .uri(
                "/api/v1/offerings?filter=status.eq.closed%7Camount.gte.100"
                    .parse()
                    .unwrap(),
            )
            .finish();
        let result = stage.apply(&request, sample()).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_poem_request_plus_decodes_to_space() {
        let request = poem::Request::builder()
            .method(Method::GET)
            .uri("/x?filter=name.eq.%22a+b%22".parse().unwrap())
            .finish();
        assert_eq!(
            request.query_param("filter"),
            Ok(Some("name.eq.\"a b\"".to_string()))
        );
    }

    #[test]
    fn test_undecodable_filter_value_is_rejected_not_ignored() {
        let stage = FilterStage::default();
        let request = poem::Request::builder()
            .method(Method::GET)
            .uri("/api/v1/offerings?filter=%FF".parse().unwrap())
            .finish();
        let rejection = stage.apply(&request, sample()).unwrap_err();
        assert!(matches!(
            rejection,
            FilterRejection::Invalid {
                stage: "decode",
                position: None,
                ..
            }
        ));
    }

    #[test]
    fn test_undecodable_unrelated_key_is_skipped() {
        let stage = FilterStage::default();
        let request = poem::Request::builder()
            .method(Method::GET)
            .uri("/x?%FF=1&filter=status.eq.active".parse().unwrap())
            .finish();
        assert_eq!(stage.apply(&request, sample()).unwrap().len(), 1);
    }
}
