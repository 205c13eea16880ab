use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::warn;

use crate::source::Resolver;

use super::error::ParamError;
use super::value::Value;

const ARRAY_DELIMITER: char = ',';

/// Typed parameter store with read-through source resolution.
///
/// Explicitly set values always win. On a miss the store consults the
/// [`Resolver`] (secret files, then environment variables) and coerces the
/// resulting text to the requested type. Values found by a bootstrap
/// [`rescan`](Self::rescan) live in a separate implicit layer that each
/// rescan rebuilds from scratch, so a reload picks up changed sources
/// without ever shadowing an explicit set.
///
/// Lookup of a name that is configured nowhere is lenient: the getter logs a
/// warning and returns the type's zero value. A value that is present but
/// malformed for the requested type is always a hard [`ParamError::Malformed`]
/// failure, since silently returning zero would mask a configuration bug.
///
/// ## Example
///
/// ```no_run
/// use condi::{ParameterStore, Resolver};
///
/// let store = ParameterStore::new(Resolver::default());
/// store.set("retries", 3).set("verbose", true);
///
/// assert_eq!(store.get_i64("retries")?, 3);
/// assert!(store.get_bool("verbose")?);
/// # Ok::<(), condi::ParamError>(())
/// ```
#[derive(Debug, Default)]
pub struct ParameterStore {
    values: RwLock<HashMap<String, Value>>,
    scanned: RwLock<HashMap<String, Value>>,
    resolver: Resolver,
}

impl ParameterStore {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            scanned: RwLock::new(HashMap::new()),
            resolver,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Stores a value verbatim, replacing any previous one. Returns the store
    /// for chaining.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.values.write().insert(name.into(), value.into());
        self
    }

    /// Rebuilds the implicit layer from the secrets directory and the
    /// prefixed environment scan.
    ///
    /// The layer is replaced wholesale, so values that changed (or vanished)
    /// since the last scan are reflected. Secrets are applied before the
    /// environment and explicit values shadow the whole layer, which is what
    /// keeps the precedence law intact: explicit sets beat secrets, secrets
    /// beat environment.
    pub fn rescan(&self) {
        let mut layer = HashMap::new();
        for (name, value) in self.resolver.scan_secrets() {
            layer.entry(name).or_insert_with(|| Value::Str(value));
        }
        for (name, value) in self.resolver.scan_env() {
            layer.entry(name).or_insert_with(|| Value::Str(value));
        }
        *self.scanned.write() = layer;
    }

    /// Replaces the entire parameter map.
    pub fn replace_all(&self, parameters: HashMap<String, Value>) -> &Self {
        *self.values.write() = parameters;
        self
    }

    /// Returns the stored value for `name`, untyped. Does not consult the
    /// implicit sources.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// A point-in-time copy of the effective parameter map: the implicit
    /// layer with explicit values shadowing it.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let mut merged = self.scanned.read().clone();
        for (name, value) in self.values.read().iter() {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    pub fn get_string(&self, name: &str) -> Result<String, ParamError> {
        match self.resolve_text(name, "string")? {
            Some(text) => Ok(text),
            None => Ok(self.zero(name, String::new())),
        }
    }

    /// Like [`get_string`](Self::get_string), but reports a name configured
    /// nowhere as `None` instead of warning and returning the empty string.
    ///
    /// Useful for probing optional parameters whose absence is expected.
    pub fn find_string(&self, name: &str) -> Result<Option<String>, ParamError> {
        self.resolve_text(name, "string")
    }

    pub fn get_i32(&self, name: &str) -> Result<i32, ParamError> {
        self.get_scalar(name, "int", |s| s.parse().ok())
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, ParamError> {
        self.get_scalar(name, "int64", |s| s.parse().ok())
    }

    pub fn get_f32(&self, name: &str) -> Result<f32, ParamError> {
        self.get_scalar(name, "float", |s| s.parse().ok())
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, ParamError> {
        self.get_scalar(name, "float64", |s| s.parse().ok())
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ParamError> {
        self.get_scalar(name, "bool", parse_bool)
    }

    pub fn get_string_array(&self, name: &str) -> Result<Vec<String>, ParamError> {
        self.get_array(name, "string array", as_str_array, |s| Some(s.to_string()))
    }

    pub fn get_i32_array(&self, name: &str) -> Result<Vec<i32>, ParamError> {
        self.get_array(name, "int array", as_i32_array, |s| s.parse().ok())
    }

    pub fn get_i64_array(&self, name: &str) -> Result<Vec<i64>, ParamError> {
        self.get_array(name, "int64 array", as_i64_array, |s| s.parse().ok())
    }

    pub fn get_f32_array(&self, name: &str) -> Result<Vec<f32>, ParamError> {
        self.get_array(name, "float array", as_f32_array, |s| s.parse().ok())
    }

    pub fn get_f64_array(&self, name: &str) -> Result<Vec<f64>, ParamError> {
        self.get_array(name, "float64 array", as_f64_array, |s| s.parse().ok())
    }

    pub fn get_bool_array(&self, name: &str) -> Result<Vec<bool>, ParamError> {
        self.get_array(name, "bool array", as_bool_array, parse_bool)
    }

    /// Resolves `name` to text: stored scalar first (canonical rendering),
    /// then a live source lookup, then the implicit layer. A stored array
    /// value cannot be read through a scalar getter.
    ///
    /// The live lookup runs before the implicit layer because it sees source
    /// changes that happened after the last rescan; the layer still matters
    /// for prefix-scanned environment names, which a direct lookup cannot
    /// reach.
    fn resolve_text(&self, name: &str, expected: &'static str) -> Result<Option<String>, ParamError> {
        if let Some(value) = self.values.read().get(name) {
            return match value.render() {
                Some(text) => Ok(Some(text)),
                None => Err(ParamError::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found: value.shape(),
                }),
            };
        }
        Ok(self
            .resolver
            .lookup(name)
            .or_else(|| self.scanned.read().get(name).and_then(Value::render)))
    }

    fn get_scalar<T>(
        &self,
        name: &str,
        target: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, ParamError>
    where
        T: Default,
    {
        match self.resolve_text(name, target)? {
            // An empty resolved value carries no information for a typed
            // getter; treat it like absence rather than a parse failure.
            Some(text) if !text.is_empty() => parse(&text).ok_or_else(|| ParamError::Malformed {
                name: name.to_string(),
                value: text,
                target,
            }),
            _ => Ok(self.zero(name, T::default())),
        }
    }

    fn get_array<T>(
        &self,
        name: &str,
        target: &'static str,
        extract: impl FnOnce(&Value) -> Option<Result<Vec<T>, ParamError>>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Vec<T>, ParamError> {
        let text = {
            let values = self.values.read();
            match values.get(name) {
                Some(value) => {
                    if let Some(native) = extract(value) {
                        return native.map_err(|e| e.named(name));
                    }
                    if value.is_array() {
                        return Err(ParamError::TypeMismatch {
                            name: name.to_string(),
                            expected: target,
                            found: value.shape(),
                        });
                    }
                    // Scalar variants always render.
                    value.render()
                }
                None => None,
            }
        };

        let text = match text
            .or_else(|| self.resolver.lookup(name))
            .or_else(|| self.scanned.read().get(name).and_then(Value::render))
        {
            Some(text) => text,
            None => return Ok(self.zero(name, Vec::new())),
        };

        // Comma-split, each element coerced independently. Note that an empty
        // string splits to a single empty element, which only the string
        // getter accepts.
        text.split(ARRAY_DELIMITER)
            .map(|element| {
                parse(element).ok_or_else(|| ParamError::Malformed {
                    name: name.to_string(),
                    value: element.to_string(),
                    target,
                })
            })
            .collect()
    }

    fn zero<T>(&self, name: &str, zero: T) -> T {
        warn!(parameter = name, "parameter not found, returning zero value");
        zero
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn as_str_array(value: &Value) -> Option<Result<Vec<String>, ParamError>> {
    match value {
        Value::StrArray(v) => Some(Ok(v.clone())),
        _ => None,
    }
}

fn as_i64_array(value: &Value) -> Option<Result<Vec<i64>, ParamError>> {
    match value {
        Value::IntArray(v) => Some(Ok(v.clone())),
        _ => None,
    }
}

fn as_i32_array(value: &Value) -> Option<Result<Vec<i32>, ParamError>> {
    match value {
        Value::IntArray(v) => Some(
            v.iter()
                .map(|&i| {
                    i32::try_from(i).map_err(|_| ParamError::Malformed {
                        name: String::new(),
                        value: i.to_string(),
                        target: "int",
                    })
                })
                .collect(),
        ),
        _ => None,
    }
}

fn as_f64_array(value: &Value) -> Option<Result<Vec<f64>, ParamError>> {
    match value {
        Value::FloatArray(v) => Some(Ok(v.clone())),
        _ => None,
    }
}

fn as_f32_array(value: &Value) -> Option<Result<Vec<f32>, ParamError>> {
    match value {
        Value::FloatArray(v) => Some(Ok(v.iter().map(|&f| f as f32).collect())),
        _ => None,
    }
}

fn as_bool_array(value: &Value) -> Option<Result<Vec<bool>, ParamError>> {
    match value {
        Value::BoolArray(v) => Some(Ok(v.clone())),
        _ => None,
    }
}

impl ParamError {
    fn named(self, name: &str) -> Self {
        match self {
            ParamError::Malformed { value, target, .. } => ParamError::Malformed {
                name: name.to_string(),
                value,
                target,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store() -> ParameterStore {
        // Point at an empty secrets root so host state cannot leak in.
        let dir = TempDir::new().unwrap();
        ParameterStore::new(Resolver::new(dir.path(), "CONDI_TEST_NOPREFIX_"))
    }

    #[test]
    fn test_explicit_set_round_trips() {
        let store = store();
        store
            .set("string_parameter", "string_parameter")
            .set("int_parameter", 100i64)
            .set("float_parameter", 100.01f32)
            .set("bool_parameter", true);

        assert_eq!(store.get_string("string_parameter").unwrap(), "string_parameter");
        assert_eq!(store.get_i32("int_parameter").unwrap(), 100);
        assert_eq!(store.get_i64("int_parameter").unwrap(), 100);
        assert!((store.get_f32("float_parameter").unwrap() - 100.01).abs() < 1e-4);
        assert!(store.get_bool("bool_parameter").unwrap());
    }

    #[test]
    fn test_int_array_round_trip_preserves_order() {
        let store = store();
        store.set("int_array_parameter", vec![-3i64, -2, -1, 0, 1, 2, 3]);

        assert_eq!(
            store.get_i64_array("int_array_parameter").unwrap(),
            vec![-3, -2, -1, 0, 1, 2, 3]
        );
        assert_eq!(
            store.get_i32_array("int_array_parameter").unwrap(),
            vec![-3, -2, -1, 0, 1, 2, 3]
        );
    }

    #[test]
    fn test_float_getters_agree() {
        let store = store();
        store.set("precision", "100.01");

        assert!((store.get_f32("precision").unwrap() - 100.01f32).abs() < 1e-4);
        assert!((store.get_f64("precision").unwrap() - 100.01f64).abs() < 1e-9);
    }

    #[test]
    fn test_bool_parsing_is_case_insensitive() {
        let store = store();
        store.set("yes", "TRUE").set("no", "False").set("bad", "notabool");

        assert!(store.get_bool("yes").unwrap());
        assert!(!store.get_bool("no").unwrap());
        assert!(matches!(
            store.get_bool("bad"),
            Err(ParamError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_key_returns_zero_values() {
        let store = store();

        assert_eq!(store.get_string("missing").unwrap(), "");
        assert_eq!(store.get_i32("missing").unwrap(), 0);
        assert_eq!(store.get_i64("missing").unwrap(), 0);
        assert_eq!(store.get_f32("missing").unwrap(), 0.0);
        assert_eq!(store.get_f64("missing").unwrap(), 0.0);
        assert!(!store.get_bool("missing").unwrap());
        assert!(store.get_i64_array("missing").unwrap().is_empty());
        assert!(store.get_string_array("missing").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_numeral_is_hard_failure() {
        let store = store();
        store.set("port", "eighty");

        assert!(matches!(
            store.get_i64("port"),
            Err(ParamError::Malformed { .. })
        ));
        assert!(matches!(
            store.get_f64("port"),
            Err(ParamError::Malformed { .. })
        ));
    }

    #[test]
    fn test_scalar_getter_rejects_array_value() {
        let store = store();
        store.set("hosts", vec!["a", "b"]);

        assert!(matches!(
            store.get_string("hosts"),
            Err(ParamError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.get_i64("hosts"),
            Err(ParamError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_array_getter_rejects_wrong_array_shape() {
        let store = store();
        store.set("flags", vec![true, false]);

        assert!(matches!(
            store.get_i64_array("flags"),
            Err(ParamError::TypeMismatch { .. })
        ));
        assert_eq!(store.get_bool_array("flags").unwrap(), vec![true, false]);
    }

    #[test]
    fn test_comma_split_coercion() {
        let store = store();
        store.set("ports", "8080,8081,8082").set("ratios", "0.5,1.5");

        assert_eq!(store.get_i64_array("ports").unwrap(), vec![8080, 8081, 8082]);
        assert_eq!(store.get_f64_array("ratios").unwrap(), vec![0.5, 1.5]);
        assert!(matches!(
            store.get_i64_array("ratios"),
            Err(ParamError::Malformed { .. })
        ));
    }

    #[test]
    fn test_empty_string_splits_to_single_empty_element() {
        let store = store();
        store.set("empty", "");

        // Degenerate case: "" splits to one empty substring.
        assert_eq!(store.get_string_array("empty").unwrap(), vec![String::new()]);
        // The same element cannot coerce to a number.
        assert!(store.get_i64_array("empty").is_err());
        // Scalar getters treat the empty text as absent.
        assert_eq!(store.get_i64("empty").unwrap(), 0);
    }

    #[test]
    fn test_rescan_never_shadows_explicit_values() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("key"), "implicit").unwrap();
        fs::write(dir.path().join("other"), "implicit").unwrap();

        let store = ParameterStore::new(Resolver::new(dir.path(), "CONDI_TEST_NOPREFIX_"));
        store.set("key", "explicit");
        store.rescan();

        assert_eq!(store.get_string("key").unwrap(), "explicit");
        assert_eq!(store.get_string("other").unwrap(), "implicit");
    }

    #[test]
    fn test_rescan_replaces_implicit_layer() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("CONDI_STORE_RESCAN_GREETING", "v1");

        let store = ParameterStore::new(Resolver::new(dir.path(), "CONDI_STORE_RESCAN_"));
        store.rescan();
        assert_eq!(store.get_string("greeting").unwrap(), "v1");

        // Prefix-scanned names are only reachable through the layer, so a
        // changed variable must show up after the next rescan.
        std::env::set_var("CONDI_STORE_RESCAN_GREETING", "v2");
        store.rescan();
        assert_eq!(store.get_string("greeting").unwrap(), "v2");

        std::env::remove_var("CONDI_STORE_RESCAN_GREETING");
        store.rescan();
        assert_eq!(store.get_string("greeting").unwrap(), "");
    }

    #[test]
    fn test_find_string_reports_absence() {
        let store = store();
        store.set("present", "here");

        assert_eq!(store.find_string("present").unwrap().as_deref(), Some("here"));
        assert_eq!(store.find_string("absent").unwrap(), None);
    }

    #[test]
    fn test_replace_all_drops_previous_entries() {
        let store = store();
        store.set("old", 1i64);
        store.replace_all(HashMap::from([("new".to_string(), Value::Int(2))]));

        assert_eq!(store.get("old"), None);
        assert_eq!(store.get_i64("new").unwrap(), 2);
    }

    #[test]
    fn test_explicit_set_beats_secret_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api_key"), "from-secret\n").unwrap();

        let store = ParameterStore::new(Resolver::new(dir.path(), "CONDI_TEST_NOPREFIX_"));
        store.set("api_key", "from-code");

        assert_eq!(store.get_string("api_key").unwrap(), "from-code");
    }

    #[test]
    fn test_secret_file_resolves_on_miss() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("api_key"), "from-secret\n").unwrap();

        let store = ParameterStore::new(Resolver::new(dir.path(), "CONDI_TEST_NOPREFIX_"));

        assert_eq!(store.get_string("api_key").unwrap(), "from-secret");
    }

    #[test]
    fn test_secret_beats_environment() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("layered_key"), "from-secret").unwrap();
        std::env::set_var("LAYERED_KEY", "from-env");

        let store = ParameterStore::new(Resolver::new(dir.path(), "CONDI_TEST_NOPREFIX_"));
        assert_eq!(store.get_string("layered_key").unwrap(), "from-secret");

        std::env::remove_var("LAYERED_KEY");
    }

    #[test]
    fn test_environment_resolves_when_no_secret() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("CONDI_STORE_ENV_ONLY", "42");

        let store = ParameterStore::new(Resolver::new(dir.path(), "CONDI_TEST_NOPREFIX_"));
        assert_eq!(store.get_i64("condi_store_env_only").unwrap(), 42);

        std::env::remove_var("CONDI_STORE_ENV_ONLY");
    }
}
