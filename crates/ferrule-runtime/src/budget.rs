//! Execution budget: visit counter, depth counter, wall-clock deadline
//! (`spec.md` §4.5).
//!
//! A plain value type, owned by a single evaluator instance for the
//! duration of one `Execute` call — no heap allocation, no atomics, no
//! sharing across threads. Every statement and every expression entry
//! calls [`Budget::check`] once.

use std::time::{Duration, Instant};

use ferrule_core::{EngineError, ErrorCode, Options};

use ferrule_compiler::Span;

pub struct Budget {
    visits: u64,
    max_visits: u64,
    max_depth: usize,
    deadline: Option<Instant>,
}

impl Budget {
    pub fn new(options: &Options) -> Self {
        let deadline = if options.timeout_milliseconds > 0 {
            Some(Instant::now() + Duration::from_millis(options.timeout_milliseconds))
        } else {
            None
        };
        Self {
            visits: 0,
            max_visits: options.max_node_visits,
            max_depth: options.max_depth,
            deadline,
        }
    }

    /// Increment the visit counter and check every limit. `depth` is 0 for
    /// statement-level checks, and the evaluator's current recursion depth
    /// for expression-level checks (`spec.md` §4.5).
    pub fn check(&mut self, depth: usize, span: Span) -> Result<(), EngineError> {
        self.visits += 1;
        if self.visits > self.max_visits {
            return Err(EngineError::new(
                ErrorCode::MaxVisitsExceeded,
                format!("exceeded maxNodeVisits ({})", self.max_visits),
                span.line,
                span.col,
            ));
        }
        if depth > self.max_depth {
            return Err(EngineError::new(
                ErrorCode::MaxDepthExceeded,
                format!("exceeded maxDepth ({})", self.max_depth),
                span.line,
                span.col,
            ));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(EngineError::new(
                    ErrorCode::ExecutionTimeout,
                    "execution timed out",
                    span.line,
                    span.col,
                ));
            }
        }
        Ok(())
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 0, 1, 1)
    }

    #[test]
    fn exhausts_visit_budget() {
        let mut opts = Options::default();
        opts.max_node_visits = 2;
        let mut budget = Budget::new(&opts);
        assert!(budget.check(0, span()).is_ok());
        assert!(budget.check(0, span()).is_ok());
        let err = budget.check(0, span()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxVisitsExceeded);
    }

    #[test]
    fn exhausts_depth_budget() {
        let mut opts = Options::default();
        opts.max_depth = 1;
        let mut budget = Budget::new(&opts);
        assert!(budget.check(1, span()).is_ok());
        let err = budget.check(2, span()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MaxDepthExceeded);
    }

    #[test]
    fn zero_timeout_never_expires() {
        let opts = Options::default();
        let mut budget = Budget::new(&opts);
        assert!(budget.check(0, span()).is_ok());
    }
}
