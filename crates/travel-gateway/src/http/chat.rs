use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Extension, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use tokio::sync::mpsc;
use uuid::Uuid;

use travel_collab::CityRepository;
use travel_core::types::now_unix;
use travel_protocol::requests::{StartChatRequest, StartChatResponse, StreamChatRequest};
use travel_protocol::{EventPayload, StreamEvent};
use travel_sessions::{Message, MessageRole, MessageType, Session, SessionContext};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// One session lasts a day of inactivity before it needs restarting.
const SESSION_TTL_SECS: i64 = 86_400;

pub async fn start_chat(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<StartChatRequest>,
) -> Result<Json<StartChatResponse>, ApiError> {
    let city_id = match req.city_name.as_deref() {
        Some(name) => state
            .collab
            .find_by_name(name)
            .await
            .map_err(travel_core::Error::from)?
            .map(|c| c.id),
        None => None,
    };

    let session = Session::new(
        Uuid::now_v7().to_string(),
        caller.user_id,
        req.profile_id,
        req.city_name.clone(),
        SESSION_TTL_SECS,
    );
    let created = state.sessions.create(&session).map_err(travel_core::Error::from)?;

    if let Some(city_id) = city_id {
        let mut ctx = SessionContext::default();
        ctx.city_id = Some(city_id);
        if let Err(e) = state
            .sessions
            .update_context(&created.session_id, created.updated_at, &ctx, None)
        {
            tracing::warn!(error = %e, session_id = %created.session_id, "failed to seed session context with resolved city");
        }
    }

    Ok(Json(StartChatResponse {
        session_id: created.session_id,
    }))
}

/// Runs one classified turn end to end and streams the result back as
/// Server-Sent Events. The same `auth_layer`/`rate_limit_layer` stack that
/// guards the unary routes guards this one too — there is no separate,
/// easier-to-forget check for the streaming path (§4.2 step 7).
pub async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<StreamChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session_id = req
        .session_id
        .ok_or_else(|| travel_core::Error::InvalidArgument("session_id is required".to_string()))?;

    let session = state
        .sessions
        .get(&session_id)
        .map_err(travel_core::Error::from)?
        .ok_or_else(|| travel_core::Error::NotFound(format!("session {session_id}")))?;
    if session.user_id != caller.user_id {
        return Err(
            travel_core::Error::PermissionDenied("session belongs to a different caller".to_string())
                .into(),
        );
    }

    let mut context = state
        .sessions
        .get_context(&session_id)
        .map_err(travel_core::Error::from)?
        .unwrap_or_default();
    if let Some(name) = req.city_name.as_deref() {
        if let Some(city) = state
            .collab
            .find_by_name(name)
            .await
            .map_err(travel_core::Error::from)?
        {
            context.city_id = Some(city.id);
        }
    }

    let user = state
        .users
        .get_by_id(&caller.user_id)
        .map_err(travel_core::Error::from)?
        .ok_or_else(|| travel_core::Error::NotFound(format!("user {}", caller.user_id)))?;

    let intent = state.classifier.classify(&req.message, &context.rolling_summary, &[]);

    let user_message = Message {
        message_id: Uuid::new_v4().to_string(),
        session_id: session_id.clone(),
        role: MessageRole::User,
        message_type: MessageType::InitialRequest,
        content: req.message.clone(),
        timestamp: now_unix(),
        metadata: None,
    };
    state
        .sessions
        .append_message(&user_message)
        .map_err(travel_core::Error::from)?;

    let city_id = context.city_id.clone().unwrap_or_default();
    let city_name = req
        .city_name
        .clone()
        .or_else(|| session.city_name.clone())
        .unwrap_or_default();
    let (tx, mut rx) = mpsc::channel(state.config.streaming.event_channel_capacity);

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.run(&intent, &context, &user, &city_id, &city_name, tx).await;
    });

    // The business-logic loop (session bookkeeping) and the transport send
    // are two different things with two different timeouts: `continue_event_timeout_ms`
    // bounds only the handler -> transport hop, the way `send_event_timeout`
    // bounds the producer -> handler hop in the fan-out workers. A slow
    // client backs off the transport channel, not the orchestrator.
    let (transport_tx, mut transport_rx) = mpsc::channel::<Event>(state.config.streaming.event_channel_capacity);
    let continue_timeout = Duration::from_millis(state.config.streaming.continue_event_timeout_ms);
    let stream_deadline = Duration::from_secs(state.config.streaming.stream_deadline_secs);

    let stream_state = state.clone();
    let stream_session_id = session_id;
    tokio::spawn(async move {
        let mut last_event_id = 0u64;
        let forward = async {
            let mut buffer = String::new();
            while let Some(event) = rx.recv().await {
                last_event_id = event.event_id;
                if let EventPayload::Chunk { content, .. } = &event.payload {
                    buffer.push_str(content);
                }

                // Durably append the assistant's turn before the terminal
                // event reaches the client — a client that disconnects
                // right after `complete` must not be able to outrace the
                // session record.
                if event.is_final {
                    let content = if buffer.is_empty() {
                        serde_json::to_string(&event.payload).unwrap_or_default()
                    } else {
                        buffer.clone()
                    };
                    let assistant_message = Message {
                        message_id: Uuid::new_v4().to_string(),
                        session_id: stream_session_id.clone(),
                        role: MessageRole::Assistant,
                        message_type: MessageType::Response,
                        content,
                        timestamp: now_unix(),
                        metadata: None,
                    };
                    if let Err(e) = stream_state.sessions.append_message(&assistant_message) {
                        tracing::warn!(error = %e, session_id = %stream_session_id, "failed to append assistant turn");
                    }
                }

                let json = serde_json::to_string(&event).unwrap_or_default();
                if tokio::time::timeout(continue_timeout, transport_tx.send(Event::default().data(json)))
                    .await
                    .is_err()
                {
                    // transport too slow to keep up; stop relaying and let
                    // the orchestrator finish on its own so cache commits
                    // and session bookkeeping above still happen.
                    return;
                }
            }
        };

        if tokio::time::timeout(stream_deadline, forward).await.is_err() {
            tracing::warn!(session_id = %stream_session_id, "stream exceeded wall-clock deadline");
            let deadline_event = StreamEvent::new(
                last_event_id + 1,
                EventPayload::Error {
                    part_type: None,
                    code: "deadline_exceeded".to_string(),
                    message: format!("stream exceeded {}s wall-clock limit", stream_deadline.as_secs()),
                },
            );
            let json = serde_json::to_string(&deadline_event).unwrap_or_default();
            let _ = transport_tx.send(Event::default().data(json)).await;
        }
    });

    let output = async_stream::stream! {
        while let Some(event) = transport_rx.recv().await {
            yield Ok::<_, Infallible>(event);
        }
    };

    Ok(Sse::new(output).keep_alive(KeepAlive::default()))
}
