use serde::Serialize;
use tracing::{debug, info, warn};

use super::registry::{
    OperationArgs, OperationOutput, OperationRegistry, ANALYZE_GRID, HELP, OPTIMIZE_GRID,
    SHOW_LAST_OPTIMIZATION,
};
use super::router::{CommandRouter, Intent};
use crate::access::validate_input;
use crate::analysis::{GridAnalysis, MetricSummary};
use crate::error::GridError;

const READY_REPLY: &str =
    "Grid optimizer ready. Ask me to optimize a region, show the last optimization, or analyze grid load.";
const REJECTED_REPLY: &str = "Invalid input detected. Please rephrase your request.";

#[derive(Debug, Clone, Serialize)]
pub struct CommandReply {
    pub intent: Intent,
    pub region: Option<String>,
    pub success: bool,
    pub text: String,
}

/// Routes chat text and runs the matching registered operation.
///
/// A missing region is passed through as `None`, which the engine reads as
/// "latest sample of any region".
pub struct CommandExecutor {
    router: CommandRouter,
    registry: OperationRegistry,
    max_len: usize,
}

impl CommandExecutor {
    pub fn new(router: CommandRouter, registry: OperationRegistry, max_len: usize) -> Self {
        Self {
            router,
            registry,
            max_len,
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub async fn execute(&self, text: &str) -> CommandReply {
        if !validate_input(text, self.max_len) {
            return CommandReply {
                intent: Intent::Unknown,
                region: None,
                success: false,
                text: REJECTED_REPLY.to_string(),
            };
        }

        let routed = self.router.route(text);
        debug!(intent = %routed.intent, region = routed.region.as_deref().unwrap_or("*"), "command routed");

        let operation = match routed.intent {
            Intent::Optimize => OPTIMIZE_GRID,
            Intent::Status => SHOW_LAST_OPTIMIZATION,
            Intent::Analyze => ANALYZE_GRID,
            Intent::Help => HELP,
            Intent::Unknown => {
                return CommandReply {
                    intent: routed.intent,
                    region: routed.region,
                    success: true,
                    text: READY_REPLY.to_string(),
                }
            }
        };

        let args = OperationArgs {
            region: routed.region.clone(),
            text: text.to_string(),
        };
        let (success, reply) = match self.registry.invoke(operation, args).await {
            Some(Ok(output)) => {
                info!(operation, region = routed.region.as_deref().unwrap_or("*"), "command executed");
                (true, describe(&output))
            }
            Some(Err(e)) => {
                warn!(operation, error = %e, "command failed");
                (false, describe_error(routed.intent, &e))
            }
            None => {
                warn!(operation, "operation not registered");
                (false, format!("Operation {} is not available.", operation))
            }
        };

        CommandReply {
            intent: routed.intent,
            region: routed.region,
            success,
            text: reply,
        }
    }
}

fn describe(output: &OperationOutput) -> String {
    match output {
        OperationOutput::Optimized(record) => format!(
            "Grid optimization completed for {}: optimized supply {:.2} MW for demand {:.2} MW, losses {:.6}.",
            record.region, record.optimized_supply, record.optimized_demand, record.losses
        ),
        OperationOutput::LastResult(record) => format!(
            "Last optimization for {} at {}: optimized supply {:.2} MW, demand {:.2} MW, losses {:.6}.",
            record.region,
            record.computed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.optimized_supply,
            record.optimized_demand,
            record.losses
        ),
        OperationOutput::Analysis(analysis) => describe_analysis(analysis),
        OperationOutput::Help(names) => format!("Available operations: {}.", names.join(", ")),
    }
}

fn describe_analysis(analysis: &GridAnalysis) -> String {
    let scope = analysis.region.as_deref().unwrap_or("all regions");
    let body = match &analysis.summary {
        MetricSummary::Efficiency {
            current_percent,
            average_percent,
            trend,
        } => format!(
            "efficiency {} (average {}, {})",
            percent(*current_percent),
            percent(*average_percent),
            trend
        ),
        MetricSummary::Load {
            current_mw,
            average_mw,
            peak_mw,
            load_factor,
        } => format!(
            "load {:.2} MW (average {:.2} MW, peak {:.2} MW, load factor {})",
            current_mw,
            average_mw,
            peak_mw,
            load_factor.map_or_else(|| "n/a".to_string(), |f| format!("{:.3}", f))
        ),
        MetricSummary::Losses {
            latest,
            average,
            max,
        } => format!("losses {:.6} (average {:.6}, max {:.6})", latest, average, max),
    };
    format!(
        "Grid analysis for {} over {} data points: {}.",
        scope, analysis.data_points, body
    )
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
}

fn describe_error(intent: Intent, error: &GridError) -> String {
    match error {
        GridError::NoData { region } => {
            let scope = region.as_deref().unwrap_or("any region");
            match intent {
                Intent::Status => format!("No optimization results recorded for {} yet.", scope),
                _ => format!("No grid state data found for {}. Import or seed samples first.", scope),
            }
        }
        GridError::InvalidRegion(region) => {
            format!("Region {} is not in the allow-list.", region)
        }
        GridError::Storage(e) => format!("Grid storage is unavailable: {}. Try again later.", e),
        other => format!("Request failed: {}.", other),
    }
}
