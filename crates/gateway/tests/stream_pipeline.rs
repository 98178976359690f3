//! End-to-end pipeline tests: the decorated store stack feeding the
//! `/run_sse` streaming state machine, with scripted runner and
//! summarizer stubs. No network, no sleeps.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;

use adk_domain::event::{Content, Event, Part};
use adk_domain::stream::BoxStream;
use adk_domain::{RequestScope, Result, Session, SessionKey};
use adk_gateway::api::run::turn_frames;
use adk_gateway::runner::AgentRunner;
use adk_providers::{Summarizer, SummaryResult};
use adk_sessions::{
    CompactingSessionStore, InMemorySessionStore, SessionStore, TrimmingSessionStore,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fixtures
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn text_event(id: &str, chars: usize, ts: f64) -> Event {
    Event {
        id: id.into(),
        invocation_id: "inv".into(),
        author: "user".into(),
        timestamp: ts,
        content: Some(Content {
            role: "user".into(),
            parts: vec![Part::Text("x".repeat(chars))],
        }),
        actions: None,
        error_message: None,
    }
}

fn runner_event(parts: Vec<Part>, error: Option<&str>) -> Event {
    Event {
        id: uuid_like(),
        invocation_id: "turn-1".into(),
        author: "assistant".into(),
        timestamp: 100.0,
        content: (!parts.is_empty()).then(|| Content {
            role: "model".into(),
            parts,
        }),
        actions: None,
        error_message: error.map(String::from),
    }
}

fn uuid_like() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static N: AtomicU64 = AtomicU64::new(0);
    format!("ev-{}", N.fetch_add(1, Ordering::Relaxed))
}

async fn seeded_store(n: usize, chars: usize) -> (Arc<dyn SessionStore>, SessionKey) {
    let base = Arc::new(InMemorySessionStore::new());
    let key = SessionKey::new("adk_chat", "u1", "s1");
    base.create_session(&key, Default::default()).await.unwrap();
    for i in 0..n {
        base.append_event(&key, text_event(&format!("e{i}"), chars, i as f64))
            .await
            .unwrap();
    }
    let trimming: Arc<dyn SessionStore> = Arc::new(TrimmingSessionStore::new(
        base,
        None,
        adk_domain::config::TrimmingConfig::default(),
    ));
    (trimming, key)
}

/// Replays one scripted event list per `run` call; records what each call
/// observed.
struct ScriptedRunner {
    scripts: Mutex<Vec<Vec<Event>>>,
    observed: Mutex<Vec<(usize, f64)>>, // (history length, retry factor)
}

impl ScriptedRunner {
    fn new(scripts: Vec<Vec<Event>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            observed: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.observed.lock().len()
    }
}

#[async_trait]
impl AgentRunner for ScriptedRunner {
    async fn run(
        &self,
        session: Session,
        _new_message: Content,
        scope: RequestScope,
    ) -> Result<BoxStream<'static, Result<Event>>> {
        self.observed
            .lock()
            .push((session.events.len(), scope.effective_retry_factor()));

        let mut scripts = self.scripts.lock();
        let script = if scripts.is_empty() {
            Vec::new()
        } else {
            scripts.remove(0)
        };
        Ok(Box::pin(stream::iter(script.into_iter().map(Ok))))
    }
}

fn frame_kind(frame: &Value) -> &'static str {
    if frame.get("error").is_some() {
        "error"
    } else if frame.get("thinking").is_some() {
        "thinking"
    } else {
        "content"
    }
}

async fn collect_frames(
    store: Arc<dyn SessionStore>,
    runner: Arc<ScriptedRunner>,
    key: SessionKey,
) -> Vec<Value> {
    turn_frames(
        store,
        runner,
        None,
        key,
        Content::user_text("hello"),
        RequestScope::default(),
    )
    .collect()
    .await
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Token-limit retry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// First attempt dies on a token-limit error; the retry streams the full
/// answer under a tightened budget. The client sees zero error frames.
#[tokio::test]
async fn token_limit_error_triggers_one_shrinking_retry() {
    let (store, key) = seeded_store(10, 2000).await;
    let runner = Arc::new(ScriptedRunner::new(vec![
        vec![runner_event(vec![], Some("Prompt too long (num_ctx exceeded)"))],
        vec![
            runner_event(vec![Part::Text("Hello".into())], None),
            runner_event(vec![Part::Text("Hello world".into())], None),
        ],
    ]));

    let frames = collect_frames(store, runner.clone(), key).await;

    assert!(frames.iter().all(|f| frame_kind(f) != "error"));
    let deltas: Vec<&str> = frames
        .iter()
        .map(|f| f["content"]["parts"][0]["text"].as_str().unwrap())
        .collect();
    assert_eq!(deltas, vec!["Hello", " world"]);

    // The retry observed a tighter budget: 10x500-token events trim to 3
    // under the 1800 default, then to 2 under the 1000-token retry floor.
    assert_eq!(runner.calls(), 2);
    let observed = runner.observed.lock().clone();
    assert_eq!(observed[0], (3, 1.0));
    assert_eq!(observed[1], (2, 0.125));
}

/// The retry is single-shot: a second token-limit error surfaces raw.
#[tokio::test]
async fn second_token_limit_error_surfaces_raw() {
    let (store, key) = seeded_store(10, 2000).await;
    let runner = Arc::new(ScriptedRunner::new(vec![
        vec![runner_event(vec![], Some("context window full"))],
        vec![runner_event(vec![], Some("context window still full"))],
    ]));

    let frames = collect_frames(store, runner.clone(), key).await;

    assert_eq!(runner.calls(), 2);
    let errors: Vec<&Value> = frames.iter().filter(|f| frame_kind(f) == "error").collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["error"], "context window still full");
}

/// Non-overflow runner errors surface immediately without a retry.
#[tokio::test]
async fn unrelated_errors_do_not_retry() {
    let (store, key) = seeded_store(4, 40).await;
    let runner = Arc::new(ScriptedRunner::new(vec![vec![
        runner_event(vec![Part::Text("partial".into())], None),
        runner_event(vec![], Some("connection refused")),
    ]]));

    let frames = collect_frames(store, runner.clone(), key).await;

    assert_eq!(runner.calls(), 1);
    assert_eq!(frames.len(), 2);
    assert_eq!(frame_kind(&frames[0]), "content");
    assert_eq!(frames[1]["error"], "connection refused");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Frame protocol
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thinking precedes content; the close frame carries the reasoning-done
/// marker and the segment id.
#[tokio::test]
async fn thinking_close_content_ordering() {
    let (store, key) = seeded_store(4, 40).await;
    let runner = Arc::new(ScriptedRunner::new(vec![vec![
        runner_event(vec![Part::Thought("reasoning…".into())], None),
        runner_event(
            vec![Part::Thought("reasoning…".into()), Part::Text("answer".into())],
            None,
        ),
    ]]));

    let frames = collect_frames(store, runner, key).await;

    let kinds: Vec<&str> = frames.iter().map(frame_kind).collect();
    assert_eq!(kinds, vec!["thinking", "thinking", "content"]);
    assert_eq!(frames[0]["thinking"]["text"], "reasoning…");
    assert_eq!(frames[1]["thinking"]["text"], "");
    assert_eq!(frames[1]["thinking"]["metadata"]["vscodeReasoningDone"], true);
    assert_eq!(frames[0]["thinking"]["id"], frames[1]["thinking"]["id"]);
    assert_eq!(frames[2]["content"]["parts"][0]["text"], "answer");
}

/// A turn that ends while reasoning is still open gets its close frame at
/// stream end.
#[tokio::test]
async fn dangling_reasoning_closes_at_done() {
    let (store, key) = seeded_store(4, 40).await;
    let runner = Arc::new(ScriptedRunner::new(vec![vec![runner_event(
        vec![Part::Thought("all thought, no answer".into())],
        None,
    )]]));

    let frames = collect_frames(store, runner, key).await;

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1]["thinking"]["text"], "");
    assert_eq!(frames[1]["thinking"]["metadata"]["vscodeReasoningDone"], true);
}

/// Concatenated content deltas reconstruct the final text even when the
/// runner restarts its stream mid-turn.
#[tokio::test]
async fn restarted_stream_is_resent_in_full() {
    let (store, key) = seeded_store(4, 40).await;
    let runner = Arc::new(ScriptedRunner::new(vec![vec![
        runner_event(vec![Part::Text("Hello".into())], None),
        runner_event(vec![Part::Text("Hello world".into())], None),
        runner_event(vec![Part::Text("Hi".into())], None),
    ]]));

    let frames = collect_frames(store, runner, key).await;

    let deltas: Vec<&str> = frames
        .iter()
        .map(|f| f["content"]["parts"][0]["text"].as_str().unwrap())
        .collect();
    assert_eq!(deltas, vec!["Hello", " world", "Hi"]);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Full decorator stack
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct StubSummarizer;

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, events: &[Event], _scope: &RequestScope) -> Option<SummaryResult> {
        Some(SummaryResult {
            content: Content {
                role: "user".into(),
                parts: vec![Part::Text(format!("{} events condensed", events.len()))],
            },
            start_timestamp: events.first()?.timestamp,
            end_timestamp: events.last()?.timestamp,
        })
    }
}

/// Compaction shrinks the history before trimming sees it, the summary
/// event is model-visible (author `user`), and chronology holds end to
/// end.
#[tokio::test]
async fn compaction_then_trimming_preserves_chronology() {
    let base = Arc::new(InMemorySessionStore::new());
    let key = SessionKey::new("adk_chat", "u1", "s1");
    base.create_session(&key, Default::default()).await.unwrap();
    for i in 0..7 {
        base.append_event(&key, text_event(&format!("e{i}"), 2000, i as f64))
            .await
            .unwrap();
    }

    let compacting = Arc::new(CompactingSessionStore::new(
        base,
        Arc::new(StubSummarizer),
        adk_domain::config::CompactionConfig {
            enabled: true,
            interval: 3,
            overlap: 1,
            min_events_to_compact: 3,
        },
    ));
    let store = TrimmingSessionStore::new(
        compacting,
        None,
        adk_domain::config::TrimmingConfig::default(),
    );

    let session = store.get_session(&key, &RequestScope::default()).await.unwrap();

    // 7 events compact to [e0, e1, summary, e6]; the summary is tiny, so
    // the 500-token originals still overflow 1800 and FIFO keeps a
    // suffix.
    assert!(session.events.len() < 7);
    assert!(session
        .events
        .windows(2)
        .all(|w| w[0].timestamp <= w[1].timestamp));
    let summary = session
        .events
        .iter()
        .find(|e| e.id.starts_with("compaction_"));
    if let Some(summary) = summary {
        assert_eq!(summary.author, "user");
        assert!(summary.content_text().starts_with("[Previous conversation summary]\n"));
    }
}

/// Decorators pass short histories through untouched (structural
/// equality on event ids).
#[tokio::test]
async fn short_history_is_identical_through_the_stack() {
    let base = Arc::new(InMemorySessionStore::new());
    let key = SessionKey::new("adk_chat", "u1", "s1");
    base.create_session(&key, Default::default()).await.unwrap();
    for i in 0..2 {
        base.append_event(&key, text_event(&format!("e{i}"), 2000, i as f64))
            .await
            .unwrap();
    }

    let compacting = Arc::new(CompactingSessionStore::new(
        base,
        Arc::new(StubSummarizer),
        adk_domain::config::CompactionConfig {
            enabled: true,
            interval: 3,
            overlap: 1,
            min_events_to_compact: 3,
        },
    ));
    let store = TrimmingSessionStore::new(
        compacting,
        None,
        adk_domain::config::TrimmingConfig::default(),
    );

    let session = store.get_session(&key, &RequestScope::default()).await.unwrap();
    let ids: Vec<&str> = session.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["e0", "e1"]);
}
