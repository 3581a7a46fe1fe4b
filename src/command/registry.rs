use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::{AnalysisMetric, GridAnalysis, GridAnalyzer};
use crate::controller::OptimizationEngine;
use crate::domain::OptimizationRecord;
use crate::error::GridResult;

pub const OPTIMIZE_GRID: &str = "optimize_grid";
pub const SHOW_LAST_OPTIMIZATION: &str = "show_last_optimization";
pub const ANALYZE_GRID: &str = "analyze_grid";
pub const HELP: &str = "help";

#[derive(Debug, Clone, Default)]
pub struct OperationArgs {
    pub region: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum OperationOutput {
    Optimized(OptimizationRecord),
    LastResult(OptimizationRecord),
    Analysis(GridAnalysis),
    Help(Vec<&'static str>),
}

pub type Operation = Arc<dyn Fn(OperationArgs) -> BoxFuture<'static, GridResult<OperationOutput>> + Send + Sync>;

/// Named operations the chat front-end can invoke, fixed after startup.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    operations: BTreeMap<&'static str, Operation>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(mut self, name: &'static str, operation: F) -> Self
    where
        F: Fn(OperationArgs) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = GridResult<OperationOutput>> + Send + 'static,
    {
        self.operations
            .insert(name, Arc::new(move |args| operation(args).boxed()));
        self
    }

    pub fn standard(engine: Arc<OptimizationEngine>, analyzer: Arc<GridAnalyzer>) -> Self {
        let optimize_engine = engine.clone();
        Self::new()
            .register(OPTIMIZE_GRID, move |args: OperationArgs| {
                let engine = optimize_engine.clone();
                async move {
                    engine
                        .optimize(args.region.as_deref())
                        .await
                        .map(OperationOutput::Optimized)
                }
            })
            .register(SHOW_LAST_OPTIMIZATION, move |args: OperationArgs| {
                let engine = engine.clone();
                async move {
                    engine
                        .latest_result(args.region.as_deref())
                        .await
                        .map(OperationOutput::LastResult)
                }
            })
            .register(ANALYZE_GRID, move |args: OperationArgs| {
                let analyzer = analyzer.clone();
                async move {
                    analyzer
                        .analyze(args.region.as_deref(), AnalysisMetric::detect(&args.text))
                        .await
                        .map(OperationOutput::Analysis)
                }
            })
            .register(HELP, |_args: OperationArgs| async {
                Ok(OperationOutput::Help(vec![OPTIMIZE_GRID, SHOW_LAST_OPTIMIZATION, ANALYZE_GRID, HELP]))
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }

    pub fn get(&self, name: &str) -> Option<Operation> {
        self.operations.get(name).cloned()
    }

    /// `None` when nothing is registered under `name`.
    pub async fn invoke(&self, name: &str, args: OperationArgs) -> Option<GridResult<OperationOutput>> {
        let operation = self.get(name)?;
        Some(operation(args).await)
    }
}
