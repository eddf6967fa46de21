//! Event-invocation mode: serve orchestrator payloads through the AWS Lambda
//! runtime API.
//!
//! Each invocation carries its own directories and run id. Gateway settings
//! (`LLM_GOVERNOR_FUNCTION`, `SUMMARIZER_PROVIDER`) still come from the
//! function's environment. The [`RunReport`] is the invocation response; a
//! fatal error is returned as the invocation error.

use crate::config::{ProcessorEvent, SummarizerConfig};
use crate::error::SummarizerError;
use crate::output::RunReport;
use crate::run::run;
use lambda_runtime::{service_fn, LambdaEvent};
use tracing::{error, info};

/// Run the Lambda event loop until the runtime shuts the function down.
///
/// A fatal run error fails only the invocation that hit it: it is reported
/// to the runtime as that invocation's error and the loop goes on to the
/// next event. The process does not exit, so a warm container keeps serving.
/// Every invocation builds its config from its own payload and no state
/// carries over from a failed one.
pub async fn serve() -> Result<(), lambda_runtime::Error> {
    info!("Running as Lambda function");
    lambda_runtime::run(service_fn(|event: LambdaEvent<ProcessorEvent>| async move {
        info!("Invocation {}", event.context.request_id);
        handle_event(event.payload)
            .await
            .map_err(|e| Box::new(e) as lambda_runtime::Error)
    }))
    .await
}

/// Process one event payload.
pub async fn handle_event(event: ProcessorEvent) -> Result<RunReport, SummarizerError> {
    handle_event_with(event, |key| std::env::var(key).ok()).await
}

/// [`handle_event`] reading gateway settings through `lookup`.
pub async fn handle_event_with<F>(
    event: ProcessorEvent,
    lookup: F,
) -> Result<RunReport, SummarizerError>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Received event: {:?}", event);
    let config = SummarizerConfig::from_event(&event, lookup)?;
    run(&config).await.inspect_err(|e| error!("Run failed: {}", e))
}
