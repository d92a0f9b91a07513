//! Log-record enrichment for SQL exceptions.
//!
//! [`SqlExceptionEnricher`] turns a [`SqlException`] into an ordered set of
//! named property values that a logging pipeline can attach to a record.
//! Which properties appear, and under which names, is controlled by
//! [`EnricherOptions`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::error::Error as StdError;

use crate::config::{ConfigError, EnricherOptions};
use crate::error::retry::format_delay;
use crate::error::Classification;
use crate::naming::{keys, AttributeNamer};
use crate::record::{find_sql_exception, ErrorRecord, SqlException};

/// Ordered property name/value pairs. The first value written under a name
/// wins; later writes to the same name are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, Value)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property unless one with the same name exists. Returns whether
    /// it was added.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Writes properties under names produced by the configured namer.
struct Writer<'a> {
    namer: &'a AttributeNamer,
    properties: Properties,
}

impl Writer<'_> {
    fn put(&mut self, key: &str, value: impl Into<Value>) {
        let name = self.namer.name(key);
        self.properties.insert_if_absent(name, value);
    }

    fn put_non_blank(&mut self, key: &str, value: &str) {
        if !value.trim().is_empty() {
            self.put(key, value);
        }
    }
}

/// Enriches log records with SQL exception details.
#[derive(Debug, Clone)]
pub struct SqlExceptionEnricher {
    options: EnricherOptions,
    namer: AttributeNamer,
}

impl SqlExceptionEnricher {
    /// Validates the options and builds an enricher.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPrefix`] when prefixed naming is in use
    /// and the prefix is empty or whitespace.
    pub fn new(options: EnricherOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let namer = options.namer()?;

        if options.include_deadlock_graph && !options.detect_deadlocks {
            tracing::warn!(
                "include_deadlock_graph has no effect while detect_deadlocks is disabled"
            );
        }

        if options.enable_diagnostics {
            tracing::debug!(
                naming = ?namer.mode(),
                retry_guidance = options.provide_retry_guidance,
                deadlocks = options.detect_deadlocks,
                "SQL exception enricher initialized"
            );
        }

        Ok(Self { options, namer })
    }

    pub fn options(&self) -> &EnricherOptions {
        &self.options
    }

    /// Enriches from any error whose source chain contains a [`SqlException`].
    ///
    /// Returns `None` when there is no SQL exception in the chain.
    pub fn enrich_error(&self, error: &(dyn StdError + 'static)) -> Option<Properties> {
        find_sql_exception(error).map(|ex| self.enrich(ex))
    }

    /// Builds the property set for an exception.
    pub fn enrich(&self, exception: &SqlException) -> Properties {
        let opts = &self.options;
        let mut w = Writer {
            namer: &self.namer,
            properties: Properties::new(),
        };

        w.put(keys::IS_SQL_EXCEPTION, true);
        w.put(keys::ERROR_COUNT, exception.errors.len());

        let Some(first) = exception.first_error() else {
            self.trace_enrichment(None, &w.properties);
            return w.properties;
        };

        write_error_fields(&mut w, first);

        if opts.include_all_errors && exception.errors.len() > 1 {
            write_all_errors(&mut w, &exception.errors);
        }

        if opts.include_connection_context {
            if let Some(conn) = &exception.connection {
                w.put_non_blank(keys::DATA_SOURCE, &conn.data_source);
                w.put_non_blank(keys::DATABASE, &conn.database);
                w.put(keys::CONNECTION_TIMEOUT, conn.connection_timeout);
            }
            if let Some(id) = &exception.client_connection_id {
                w.put_non_blank(keys::CLIENT_CONNECTION_ID, id);
            }
        }

        let c = Classification::of(first);

        if opts.detect_transient_failures {
            w.put(keys::IS_TRANSIENT, c.is_transient());
        }

        if opts.detect_deadlocks {
            w.put(keys::IS_DEADLOCK, c.is_deadlock);
            if opts.include_deadlock_graph {
                if let Some(graph) = c.deadlock_graph {
                    w.put(keys::DEADLOCK_GRAPH, graph);
                }
            }
        }

        if opts.classify_timeouts {
            w.put(keys::IS_TIMEOUT, c.is_timeout);
            if c.is_timeout {
                w.put(keys::TIMEOUT_TYPE, c.timeout_type.as_str());
            }
        }

        if opts.categorize_errors {
            w.put(keys::ERROR_CATEGORY, c.category.as_str());
            w.put(keys::IS_USER_ERROR, c.is_user_error);
            w.put(keys::IS_SYSTEM_ERROR, c.is_system_error());
        }

        if opts.provide_retry_guidance {
            w.put(keys::SHOULD_RETRY, c.retry.should_retry);
            w.put(keys::RETRY_STRATEGY, c.retry.strategy.as_str());
            w.put(keys::SUGGESTED_RETRY_DELAY, format_delay(c.retry.suggested_delay));
            w.put(keys::MAX_RETRIES, c.retry.max_retries);
            w.put(keys::RETRY_REASON, c.retry.reason);
        }

        if opts.include_severity_level {
            w.put(keys::SEVERITY_LEVEL, c.severity_level.as_str());
            w.put(
                keys::REQUIRES_IMMEDIATE_ATTENTION,
                c.requires_immediate_attention,
            );
        }

        self.trace_enrichment(Some(first.code), &w.properties);
        w.properties
    }

    fn trace_enrichment(&self, code: Option<i32>, properties: &Properties) {
        if self.options.enable_diagnostics {
            tracing::debug!(
                error_number = ?code,
                properties = properties.len(),
                "enriched SQL exception"
            );
        }
    }
}

fn write_error_fields(w: &mut Writer<'_>, error: &ErrorRecord) {
    w.put(keys::NUMBER, error.code);
    w.put(keys::STATE, error.state);
    w.put(keys::CLASS, error.severity_class);
    w.put_non_blank(keys::PROCEDURE, &error.procedure);
    w.put(keys::LINE, error.line);
    w.put_non_blank(keys::SERVER, &error.server);
    w.put_non_blank(keys::MESSAGE, &error.message);
}

fn write_all_errors(w: &mut Writer<'_>, errors: &[ErrorRecord]) {
    w.put(
        keys::ALL_NUMBERS,
        errors.iter().map(|e| e.code).collect::<Vec<_>>(),
    );
    w.put(
        keys::ALL_STATES,
        errors.iter().map(|e| e.state).collect::<Vec<_>>(),
    );
    w.put(
        keys::ALL_CLASSES,
        errors.iter().map(|e| e.severity_class).collect::<Vec<_>>(),
    );
    w.put(
        keys::ALL_MESSAGES,
        errors.iter().map(|e| e.message.clone()).collect::<Vec<_>>(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enricher() -> SqlExceptionEnricher {
        SqlExceptionEnricher::new(EnricherOptions::default()).unwrap()
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let mut props = Properties::new();
        assert!(props.insert_if_absent("a", 1));
        assert!(!props.insert_if_absent("a", 2));
        assert_eq!(props.get("a"), Some(&json!(1)));
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_serializes_in_order() {
        let mut props = Properties::new();
        props.insert_if_absent("z", true);
        props.insert_if_absent("a", "x");
        assert_eq!(serde_json::to_string(&props).unwrap(), r#"{"z":true,"a":"x"}"#);
    }

    #[test]
    fn test_pretty_output_keeps_insertion_order() {
        let mut props = Properties::new();
        props.insert_if_absent("z", 1);
        props.insert_if_absent("a", 2);
        props.insert_if_absent("m", 3);

        let pretty = serde_json::to_string_pretty(&props).unwrap();
        let z = pretty.find("\"z\"").unwrap();
        let a = pretty.find("\"a\"").unwrap();
        let m = pretty.find("\"m\"").unwrap();
        assert!(z < a && a < m, "{pretty}");
    }

    #[test]
    fn test_basic_fields() {
        let ex = SqlException::from_error(
            ErrorRecord::new(1205, 20)
                .with_state(13)
                .with_procedure("sp_TestProcedure")
                .with_line(42)
                .with_message("Deadlock"),
        );
        let props = enricher().enrich(&ex);

        assert_eq!(props.get("SqlException_IsSqlException"), Some(&json!(true)));
        assert_eq!(props.get("SqlException_Number"), Some(&json!(1205)));
        assert_eq!(props.get("SqlException_State"), Some(&json!(13)));
        assert_eq!(props.get("SqlException_Class"), Some(&json!(20)));
        assert_eq!(
            props.get("SqlException_Procedure"),
            Some(&json!("sp_TestProcedure"))
        );
        assert_eq!(props.get("SqlException_Line"), Some(&json!(42)));
        assert_eq!(props.get("SqlException_ErrorCount"), Some(&json!(1)));
    }

    #[test]
    fn test_blank_fields_omitted() {
        let ex = SqlException::from_error(ErrorRecord::new(547, 16).with_server("  "));
        let props = enricher().enrich(&ex);

        assert!(!props.contains("SqlException_Procedure"));
        assert!(!props.contains("SqlException_Server"));
        assert!(!props.contains("SqlException_Message"));
    }

    #[test]
    fn test_no_errors_only_markers() {
        let ex = SqlException::from_errors("empty", vec![]);
        let props = enricher().enrich(&ex);

        let names: Vec<&str> = props.names().collect();
        assert_eq!(
            names,
            vec!["SqlException_IsSqlException", "SqlException_ErrorCount"]
        );
        assert_eq!(props.get("SqlException_ErrorCount"), Some(&json!(0)));
    }

    #[test]
    fn test_timeout_type_only_for_timeouts() {
        let props = enricher().enrich(&SqlException::from_error(ErrorRecord::new(547, 16)));
        assert_eq!(props.get("SqlException_IsTimeout"), Some(&json!(false)));
        assert!(!props.contains("SqlException_TimeoutType"));
    }

    #[test]
    fn test_deadlock_graph_requires_detection() {
        let options = EnricherOptions::new().with_deadlock_detection(false);
        let enricher = SqlExceptionEnricher::new(options).unwrap();
        let ex = SqlException::from_error(
            ErrorRecord::new(1205, 13).with_message("<deadlock-list><deadlock/></deadlock-list>"),
        );
        let props = enricher.enrich(&ex);

        assert!(!props.contains("SqlException_IsDeadlock"));
        assert!(!props.contains("SqlException_DeadlockGraph"));
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let err = SqlExceptionEnricher::new(EnricherOptions::new().with_property_prefix(" "))
            .unwrap_err();
        assert!(err.to_string().contains("property_prefix"));
    }
}
