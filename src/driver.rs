//! The driver loop: send a query, drain events to the first terminal one,
//! print the answer.
//!
//! Only the first terminal event counts. Anything the runner would produce
//! after it is never pulled from the stream.

use std::fmt;
use std::io::Write;

use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::agent_loop::{Event, Runner};
use crate::error::{AgentreeError, Result};
use crate::types::Content;

/// Printed when the stream ends without a terminal event.
pub const NO_FINAL_RESPONSE: &str = "Agent did not produce a final response.";
/// Printed when an escalation carries no message.
pub const NO_ESCALATION_MESSAGE: &str = "No specific message.";

/// What a query produced, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalResponse {
    Text(String),
    Escalated(Option<String>),
    NoResponse,
}

impl FinalResponse {
    /// Interpret a terminal event.
    ///
    /// A terminal event with neither text nor an escalation flag leaves the
    /// placeholder in place.
    pub fn from_event(event: &Event) -> Self {
        if let Some(text) = event.first_text() {
            Self::Text(text.to_string())
        } else if event.is_escalation() {
            Self::Escalated(event.error_message.clone())
        } else {
            Self::NoResponse
        }
    }
}

impl fmt::Display for FinalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Escalated(message) => write!(
                f,
                "Agent escalated: {}",
                message.as_deref().unwrap_or(NO_ESCALATION_MESSAGE)
            ),
            Self::NoResponse => f.write_str(NO_FINAL_RESPONSE),
        }
    }
}

/// Consume `events` up to and including the first terminal event.
pub async fn drain_final_response<S>(events: S) -> Result<FinalResponse>
where
    S: Stream<Item = Result<Event>> + Unpin,
{
    let mut events = events;
    while let Some(event) = events.next().await {
        let event = event?;
        if event.is_final_response() {
            return Ok(FinalResponse::from_event(&event));
        }
    }
    Ok(FinalResponse::NoResponse)
}

/// Send one query through `runner` and print the exchange to `out`.
///
/// Failures while draining come back as [`AgentreeError::Drain`].
pub async fn call_agent<R, W>(
    runner: &R,
    user_id: &str,
    session_id: &str,
    query: &str,
    out: &mut W,
) -> Result<FinalResponse>
where
    R: Runner + ?Sized,
    W: Write,
{
    writeln!(out, "\n>>> User Query: {query}")?;

    let content = Content::user_text(query);
    let events = runner.run_async(user_id, session_id, content);
    let response = drain_final_response(events)
        .await
        .map_err(AgentreeError::into_drain)?;

    writeln!(out, "<<< Agent Response: {response}")?;
    Ok(response)
}

/// Outcome of [`run_conversation`].
#[derive(Debug, Default)]
pub struct ConversationReport {
    pub responses: Vec<FinalResponse>,
    /// Set when a query failed; later queries were not sent.
    pub error: Option<AgentreeError>,
}

impl ConversationReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Send `queries` in order over one session.
///
/// A failure is caught here: it is logged with its full cause chain, printed
/// to `out`, and recorded in the report. The caller is never handed an error.
pub async fn run_conversation<R, W>(
    runner: &R,
    user_id: &str,
    session_id: &str,
    queries: &[String],
    out: &mut W,
) -> ConversationReport
where
    R: Runner + ?Sized,
    W: Write,
{
    let mut report = ConversationReport::default();
    for query in queries {
        match call_agent(runner, user_id, session_id, query, out).await {
            Ok(response) => report.responses.push(response),
            Err(err) => {
                let trace = error_chain(&err);
                error!(error = %err, trace = %trace, "conversation failed");
                let written = writeln!(out, "An error occurred during the async conversation: {err}")
                    .and_then(|()| writeln!(out, "{trace}"));
                if let Err(io) = written {
                    warn!(error = %io, "could not write conversation error report");
                }
                report.error = Some(err);
                break;
            }
        }
    }
    info!(
        queries = queries.len(),
        answered = report.responses.len(),
        failed = !report.succeeded(),
        "conversation finished"
    );
    report
}

/// Render an error and every `source()` below it, one per line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut lines = vec![format!("Error: {err}")];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("  caused by: {cause}"));
        source = cause.source();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use uuid::Uuid;

    fn text_event(text: &str) -> Event {
        Event::new(Uuid::nil(), "ReportWriter", Some(Content::model_text(text)))
    }

    #[test]
    fn escalation_renders_message_or_fallback() {
        assert_eq!(
            FinalResponse::Escalated(Some("quota".into())).to_string(),
            "Agent escalated: quota"
        );
        assert_eq!(
            FinalResponse::Escalated(None).to_string(),
            "Agent escalated: No specific message."
        );
        assert_eq!(FinalResponse::NoResponse.to_string(), NO_FINAL_RESPONSE);
    }

    #[tokio::test]
    async fn empty_stream_yields_placeholder() {
        let events = stream::iter(Vec::<Result<Event>>::new());
        assert_eq!(
            drain_final_response(events).await.unwrap(),
            FinalResponse::NoResponse
        );
    }

    #[tokio::test]
    async fn first_terminal_event_wins() {
        let events = stream::iter(vec![
            Ok(text_event("first")),
            Ok(text_event("second")),
        ]);
        assert_eq!(
            drain_final_response(events).await.unwrap(),
            FinalResponse::Text("first".into())
        );
    }

    #[tokio::test]
    async fn errors_before_terminal_event_propagate() {
        let events = stream::iter(vec![
            Err(AgentreeError::api(500, "down")),
            Ok(text_event("never")),
        ]);
        assert!(drain_final_response(events).await.is_err());
    }

    #[test]
    fn error_chain_lists_sources() {
        let err = AgentreeError::api(503, "overloaded").into_drain();
        let trace = error_chain(&err);
        assert!(trace.starts_with("Error: Event stream failed"));
        assert!(trace.contains("caused by: API error (status 503): overloaded"));
    }
}
