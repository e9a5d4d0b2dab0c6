//! Named functions the server can evaluate.

use std::sync::Arc;

use ahash::AHashMap;
use cellcall_protocol::{CallRequest, CellError, Reply, Value};

/// A function callable by name from a spreadsheet.
///
/// Returning `Err(kind)` sends the error back with an error status. Returning
/// `Ok(Value::Error(..))` sends it back as an ordinary value.
pub trait Function: Send + Sync {
    fn call(&self, args: &[Value]) -> Result<Value, CellError>;
}

impl<F> Function for F
where
    F: Fn(&[Value]) -> Result<Value, CellError> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> Result<Value, CellError> {
        self(args)
    }
}

/// Function table keyed by upper-cased name.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: AHashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry);
        registry
    }

    /// Register a closure or plain `fn` under `name`, replacing any previous
    /// entry.
    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, CellError> + Send + Sync + 'static,
    {
        self.register_function(name, Arc::new(function));
    }

    /// Register any [`Function`] implementation under `name`.
    pub fn register_function(&mut self, name: &str, function: Arc<dyn Function>) {
        let key = name.to_ascii_uppercase();
        if self.functions.insert(key, function).is_some() {
            tracing::debug!("Replaced function {name}");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(&name.to_ascii_uppercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_uppercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Evaluate a request and build its reply.
    pub fn invoke(&self, request: &CallRequest) -> Reply {
        let Some(function) = self.get(&request.name) else {
            tracing::warn!("Unknown function {}", request.name);
            return Reply::error(CellError::Name);
        };

        match function.call(request.args.as_slice()) {
            Ok(value) => Reply::ok(value),
            Err(kind) => {
                tracing::debug!("{}() failed with {kind}", request.name);
                Reply::error(kind)
            }
        }
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
