//! `Engine`: the public `compile`/`execute`/`validate` facade
//! (`spec.md` §4.7). `execute` always returns a result object rather than
//! an `Err` — compile and runtime failures alike are folded into
//! `ExecutionResult`'s `has_error`/`error_*` fields.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use ferrule_compiler::diagnostics::{snippet_for, split_lines};
use ferrule_compiler::{count_nodes, parse, parse_error_to_engine_error, Block};
use ferrule_core::{EngineError, ErrorCode, ExecutionResult, Options, Value, ValidationResult};

use crate::analyzer;
use crate::builtins;
use crate::cache::{CacheEntry, CompilationCache};
use crate::converter::ConverterRegistry;
use crate::evaluator::Evaluator;
use crate::function::FunctionRegistry;

/// An embeddable engine instance: one `Options`, one pair of registries, one
/// compilation cache. `Send + Sync` — the only interior mutability is the
/// cache's mutex (`spec.md` §5).
pub struct Engine {
    options: Options,
    converters: ConverterRegistry,
    functions: FunctionRegistry,
    cache: CompilationCache,
}

impl Engine {
    /// An engine with every built-in string/math/datetime function and the
    /// default converter set registered (`spec.md` §6's "a host may still
    /// construct an Engine with an empty registry" leaves this as the
    /// convenient default, not the only path).
    pub fn new(options: Options) -> Self {
        let mut functions = FunctionRegistry::new();
        builtins::register_all(&mut functions);
        Self {
            options,
            converters: ConverterRegistry::new(),
            functions,
            cache: CompilationCache::new(),
        }
    }

    /// An engine with empty registries — the extension seam `spec.md` §6
    /// describes, for a host that wants to register only what it needs.
    pub fn bare(options: Options) -> Self {
        Self {
            options,
            converters: ConverterRegistry::new(),
            functions: FunctionRegistry::new(),
            cache: CompilationCache::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        &mut self.converters
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// `compile(script) -> Block` (`spec.md` §4.7): cache hit returns the
    /// shared entry; otherwise parse, enforce `maxNodes`, and publish.
    pub fn compile(&self, source: &str) -> Result<Arc<CacheEntry>, EngineError> {
        if self.options.enable_compilation_cache {
            if let Some(entry) = self.cache.get(source) {
                tracing::debug!(bytes = source.len(), "compilation cache hit");
                return Ok(entry);
            }
        }
        tracing::debug!(bytes = source.len(), "compilation cache miss, parsing");
        let entry = Arc::new(self.compile_uncached(source)?);
        if self.options.enable_compilation_cache {
            self.cache.insert(source.to_string(), entry.clone());
        }
        Ok(entry)
    }

    fn compile_uncached(&self, source: &str) -> Result<CacheEntry, EngineError> {
        let block = parse(source, self.options.enable_comments).map_err(|e| parse_error_to_engine_error(&e))?;
        let total_nodes = count_nodes(&block);
        if total_nodes > self.options.max_nodes {
            tracing::warn!(total_nodes, max_nodes = self.options.max_nodes, "script too large");
            return Err(EngineError::new(
                ErrorCode::ScriptTooLarge,
                format!("script has {total_nodes} nodes, exceeding maxNodes ({})", self.options.max_nodes),
                1,
                1,
            ));
        }
        Ok(CacheEntry {
            block,
            lines: split_lines(source),
        })
    }

    /// `execute(script, inputs) -> ExecutionResult` (`spec.md` §4.7):
    /// compile (catching any failure into a result of the same shape),
    /// then run the evaluator.
    pub fn execute(&self, source: &str, inputs: HashMap<String, Value>) -> ExecutionResult {
        let start = Instant::now();
        match self.compile(source) {
            Ok(entry) => {
                let mut result = self.run(&entry.block, inputs, start);
                if result.has_error && result.error_snippet.is_none() && result.error_line > 0 {
                    result.error_snippet = snippet_for(&entry.lines, result.error_line);
                }
                result
            }
            Err(e) => {
                let lines = split_lines(source);
                let snippet = snippet_for(&lines, e.line);
                ExecutionResult::failure(HashMap::new(), Vec::new(), start.elapsed(), e.code, e.message, e.line, e.column, snippet)
            }
        }
    }

    /// `execute(block, inputs) -> ExecutionResult` (`spec.md` §4.7): skips
    /// compilation entirely, for a caller holding an already-compiled
    /// `Block` (e.g. from a prior `compile`).
    pub fn execute_block(&self, block: &Block, inputs: HashMap<String, Value>) -> ExecutionResult {
        self.run(block, inputs, Instant::now())
    }

    fn run(&self, block: &Block, inputs: HashMap<String, Value>, start: Instant) -> ExecutionResult {
        let mut evaluator = Evaluator::new(&self.options, &self.converters, &self.functions, inputs);
        let outcome = evaluator.run(block);
        match outcome {
            Ok(()) => {
                let span = evaluator.last_span();
                let (assignments, messages, _, _) = evaluator.into_parts();
                ExecutionResult::success(assignments, messages, start.elapsed(), span.line, span.col)
            }
            Err(e) => {
                tracing::debug!(code = %e.code, line = e.line, column = e.column, "execution failed");
                let (assignments, messages, _, _) = evaluator.into_parts();
                ExecutionResult::failure(assignments, messages, start.elapsed(), e.code, e.message, e.line, e.column, None)
            }
        }
    }

    /// `validate(script) -> ValidationResult` (`spec.md` §4.7, §6): compile,
    /// then run the read-only analyzer boundary.
    pub fn validate(&self, source: &str) -> ValidationResult {
        match self.compile(source) {
            Ok(entry) => analyzer::analyze(&entry.block, &self.functions),
            Err(e) => ValidationResult::compile_failure(e.code, e.message, e.line, e.column),
        }
    }

    /// `clearCache()` (`spec.md` §4.7).
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_runs_scenario_one() {
        let engine = Engine::default();
        let result = engine.execute("{ set(a, 1+2*3) set(b, (1+2)*3) set(c, 7%4) set(d, 8/2) }", HashMap::new());
        assert!(!result.has_error);
        assert_eq!(result.assignments["a"], Value::Number(7.into()));
        assert_eq!(result.assignments["b"], Value::Number(9.into()));
    }

    #[test]
    fn execute_surfaces_parse_error_with_snippet() {
        let engine = Engine::default();
        let result = engine.execute("{ set(a, ) }", HashMap::new());
        assert!(result.has_error);
        assert!(result.error_snippet.is_some());
    }

    #[test]
    fn compile_twice_hits_cache() {
        let engine = Engine::default();
        let source = "{ set(a, 1) }";
        let first = engine.compile(source).unwrap();
        let second = engine.compile(source).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn clear_cache_forces_recompile() {
        let engine = Engine::default();
        let source = "{ set(a, 1) }";
        let first = engine.compile(source).unwrap();
        engine.clear_cache();
        let second = engine.compile(source).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn oversized_script_fails_to_compile() {
        let mut opts = Options::default();
        opts.max_nodes = 1;
        let engine = Engine::new(opts);
        let result = engine.execute("{ set(a, 1+2) }", HashMap::new());
        assert!(result.has_error);
        assert_eq!(result.error_code, Some(ErrorCode::ScriptTooLarge));
    }

    #[test]
    fn validate_warns_on_unregistered_function() {
        let engine = Engine::bare(Options::default());
        let result = engine.validate("{ set(a, Mystery(1)) }");
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
    }
}
