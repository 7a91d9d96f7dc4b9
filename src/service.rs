//! Evaluation Service
//!
//! Public entry point: resolves expression text to a compiled form through
//! the cache, compiling on a miss, and evaluates it against caller bindings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheStats, CacheStore};
use crate::error::{Result, ServiceError};
use crate::expr::{Bindings, CompiledExpression, Compiler, OutputType, TypedValue};

// == Evaluation Service ==
/// Evaluates expressions, caching only their compiled forms.
///
/// Cheap to clone; clones share the same store and compiler.
#[derive(Clone)]
pub struct EvaluationService {
    store: Arc<CacheStore>,
    compiler: Arc<dyn Compiler>,
    /// TTL given to every entry this service inserts
    ttl: Duration,
}

impl EvaluationService {
    pub fn new(store: Arc<CacheStore>, compiler: Arc<dyn Compiler>, ttl: Duration) -> Self {
        Self {
            store,
            compiler,
            ttl,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Evaluate ==
    /// Evaluates `expression` as `output_type` against `bindings`.
    ///
    /// The output type is checked before anything else, so an unsupported
    /// type never reaches the cache or the compiler. Results are not cached;
    /// every call evaluates against the bindings it is given.
    pub async fn evaluate(
        &self,
        expression: &str,
        output_type: &str,
        bindings: &Bindings,
    ) -> Result<TypedValue> {
        let output_type: OutputType = output_type.parse()?;
        let compiled = self.compiled(expression).await?;

        let value = match output_type {
            OutputType::String => TypedValue::String(compiled.eval_string(bindings)?),
            OutputType::Int => TypedValue::Int(compiled.eval_int(bindings)?),
            OutputType::Boolean => TypedValue::Bool(compiled.eval_bool(bindings)?),
        };
        Ok(value)
    }

    // == Compiled Lookup ==
    /// Returns the cached compiled form, compiling and inserting on a miss.
    ///
    /// Concurrent misses on the same text may each compile; the last insert
    /// wins and the forms are equivalent.
    pub async fn compiled(&self, expression: &str) -> Result<Arc<dyn CompiledExpression>> {
        if let Some(compiled) = self.store.get(expression).await {
            debug!(expression, "compiled expression cache hit");
            return Ok(compiled);
        }

        debug!(expression, "compiled expression cache miss, compiling");
        let compiled = match self.compiler.compile(expression) {
            Ok(compiled) => compiled,
            Err(err) => {
                self.store.counters().record_parse_failure();
                return Err(ServiceError::Parse(err));
            }
        };
        self.store.counters().record_compile();

        self.store
            .put(expression.to_string(), Arc::clone(&compiled), self.ttl)
            .await;
        Ok(compiled)
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }
}

impl fmt::Debug for EvaluationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationService")
            .field("store", &self.store)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
