//! Pre/post turn hooks backed by the external context service.
//!
//! Hook failures never break a turn: every error here is logged and the
//! original message or outcome flows on unchanged.

use std::sync::Arc;

use adk_context::{events_to_messages, Message, MessagePart, MessageRole};
use adk_domain::config::StrategiesConfig;
use adk_domain::event::{Content, Part};
use adk_domain::Session;
use adk_memory::{ContextService, IngestRequest, TaskOutcome};

/// Recovery guidance is prepended to the user's turn with this literal
/// glue so the model still sees the original request verbatim.
const RECOVERY_GLUE: &str = "\n\n[User message]\n";

/// Detection below this confidence is treated as noise.
const STUCK_CONFIDENCE_FLOOR: f64 = 0.5;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pre-turn: stuck detection + sieve enrichment
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn message_text(content: &Content) -> String {
    let mut out = String::new();
    for part in &content.parts {
        match part {
            Part::Text(t) | Part::Thought(t) => out.push_str(t),
            Part::Value(v) => out.push_str(&adk_domain::event::stringify_value(v)),
            Part::Inline(_) => {}
        }
    }
    out
}

/// Swap the message text while carrying non-text parts along.
fn with_text(content: &Content, text: String) -> Content {
    let mut parts = vec![Part::Text(text)];
    parts.extend(
        content
            .parts
            .iter()
            .filter(|p| !matches!(p, Part::Text(_) | Part::Thought(_)))
            .cloned(),
    );
    Content {
        role: content.role.clone(),
        parts,
    }
}

/// Run stuck detection and sieve enrichment over the incoming message.
/// Returns the (possibly rewritten) message to hand to the runner.
pub async fn enrich_new_message(
    service: &dyn ContextService,
    config: &StrategiesConfig,
    session: &Session,
    new_message: &Content,
) -> Content {
    let user_text = message_text(new_message);
    let mut text = user_text.clone();

    // ── Stuck detection over the recent exchange ────────────────────
    let (mut messages, _) = events_to_messages(&session.events);
    messages.push(Message {
        role: MessageRole::User,
        content: vec![MessagePart::text(user_text.clone())],
    });

    match service.detect_stuck(&messages).await {
        Ok(detection) if detection.is_stuck && detection.confidence >= STUCK_CONFIDENCE_FLOOR => {
            tracing::info!(
                kind = %detection.kind,
                confidence = detection.confidence,
                "conversation looks stuck, injecting recovery guidance"
            );
            match service.generate_recovery_message(&detection).await {
                Ok(recovery) => {
                    let guidance = recovery.text();
                    if !guidance.is_empty() {
                        text = format!("{guidance}{RECOVERY_GLUE}{user_text}");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "recovery message generation failed");
                }
            }
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "stuck detection failed");
        }
    }

    // ── Associative recall under a small budget ─────────────────────
    match service.sieve(&user_text, config.sieve_token_budget).await {
        Ok(result) if !result.context.trim().is_empty() => {
            tracing::debug!(
                nodes = result.nodes_included,
                "sieve enrichment attached"
            );
            text = format!("{text}\n\n[Relevant context]\n{}", result.context);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "sieve enrichment failed");
        }
    }

    if text == user_text {
        new_message.clone()
    } else {
        with_text(new_message, text)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Post-turn: exchange ingestion + task outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Ingest a short summary of the exchange and record the outcome,
/// asynchronously — the SSE stream has already closed.
pub fn spawn_post_turn(
    service: Arc<dyn ContextService>,
    session_id: String,
    user_text: String,
    answer_text: String,
    had_error: bool,
) {
    tokio::spawn(async move {
        let summary = format!(
            "User: {}\nAssistant: {}",
            truncate_chars(&user_text, 200),
            truncate_chars(&answer_text, 500),
        );

        let req = IngestRequest {
            content: summary,
            category: "conversation".into(),
            subcategory: Some("exchange".into()),
            source: Some("run_sse".into()),
            tags: vec![format!("session:{session_id}")],
        };
        if let Err(e) = service.ingest(req).await {
            tracing::warn!(error = %e, "post-turn ingest failed");
        }

        let outcome = if had_error {
            TaskOutcome::Failure
        } else {
            TaskOutcome::Success
        };
        if let Err(e) = service.record_task_outcome(outcome).await {
            tracing::warn!(error = %e, "task outcome recording failed");
        }
    });
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
