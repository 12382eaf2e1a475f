use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc, Mutex};
use uuid::Uuid;

use crate::analytics::window::Granularity;
use crate::analytics::MoodAnalyticsEngine;
use crate::auth::jwt::{verify_token_of_type, TokenType};
use crate::dto::{WsClientMessage, WsServerMessage};
use crate::error::AppResult;
use crate::handlers::analytics::{bucketer_for, load_entries, reference_instant};
use crate::services::snapshot::SnapshotSlot;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let user_id = match authenticate_ws(&state, query.token.as_deref()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("WebSocket auth failed: {}", e);
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

fn authenticate_ws(state: &AppState, token: Option<&str>) -> Result<Uuid, &'static str> {
    let token = token.ok_or("Missing token query parameter")?;
    verify_token_of_type(token, TokenType::Access, &state.config)
        .map(|claims| claims.sub)
        .map_err(|_| "Invalid or expired access token")
}

/// The analytics view a connection is looking at.
#[derive(Debug, Clone, Default)]
struct View {
    granularity: Granularity,
    date: Option<NaiveDate>,
    tz: Option<String>,
    week_start: Option<String>,
}

struct Session {
    state: AppState,
    user_id: Uuid,
    view: Mutex<View>,
    reports: SnapshotSlot,
    out: mpsc::UnboundedSender<WsServerMessage>,
}

impl Session {
    /// Updates the view for a client message and takes a report ticket for
    /// it under the same lock. The view is left untouched on error.
    async fn apply(&self, msg: WsClientMessage) -> AppResult<(View, u64)> {
        let mut view = self.view.lock().await;
        match msg {
            WsClientMessage::Select {
                granularity,
                date,
                tz,
                week_start,
            } => {
                let mut next = view.clone();
                if let Some(granularity) = granularity {
                    next.granularity = granularity;
                }
                if date.is_some() {
                    next.date = date;
                }
                if tz.is_some() {
                    next.tz = tz;
                }
                if week_start.is_some() {
                    next.week_start = week_start;
                }
                bucketer_for(
                    &self.state.config,
                    next.tz.as_deref(),
                    next.week_start.as_deref(),
                )?;
                *view = next;
            }
            WsClientMessage::Navigate { step } => {
                let bucketer = bucketer_for(
                    &self.state.config,
                    view.tz.as_deref(),
                    view.week_start.as_deref(),
                )?;
                let reference = reference_instant(&bucketer, view.date, Utc::now());
                let shifted = bucketer.shift(reference, view.granularity, step.unwrap_or(1));
                view.date = Some(bucketer.local_date(shifted));
            }
            WsClientMessage::Refresh => {}
        }
        Ok((view.clone(), self.reports.issue()))
    }

    /// Current view plus a fresh ticket. Tickets follow view changes in order,
    /// so the newest ticket always belongs to the newest view.
    async fn snapshot_and_issue(&self) -> (View, u64) {
        let view = self.view.lock().await;
        (view.clone(), self.reports.issue())
    }

    /// Computes a report for `view` in the background. Only the newest
    /// ticket's result reaches the client.
    fn recompute(self: &Arc<Self>, ticket: u64, view: View) {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.compute(ticket, view).await });
    }

    async fn compute(&self, ticket: u64, view: View) {
        let bucketer = match bucketer_for(
            &self.state.config,
            view.tz.as_deref(),
            view.week_start.as_deref(),
        ) {
            Ok(bucketer) => bucketer,
            Err(e) => {
                let _ = self.out.send(WsServerMessage::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        let reference = reference_instant(&bucketer, view.date, Utc::now());
        let date = bucketer.local_date(reference);
        let entries = load_entries(&self.state, self.user_id).await;
        let report = MoodAnalyticsEngine::new(bucketer).report(&entries, reference, view.granularity);

        let out = &self.out;
        self.reports
            .apply(ticket, report, |report| {
                let _ = out.send(WsServerMessage::Report {
                    ticket,
                    date,
                    report,
                });
            })
            .await;
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsServerMessage>();
    let mut events = state.ws_tx.subscribe();

    tracing::debug!(user_id = %user_id, "WebSocket connection established");

    let session = Arc::new(Session {
        state,
        user_id,
        view: Mutex::new(View::default()),
        reports: SnapshotSlot::new(),
        out: out_tx,
    });
    let (view, ticket) = session.snapshot_and_issue().await;
    session.recompute(ticket, view);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode WebSocket message");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Entry changes for this user are forwarded and trigger a fresh report.
    let events_session = Arc::clone(&session);
    let mut event_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if event.user_id() == user_id => {
                    let _ = events_session.out.send(WsServerMessage::Event { event });
                    let (view, ticket) = events_session.snapshot_and_issue().await;
                    events_session.recompute(ticket, view);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %user_id, skipped, "WebSocket lagged behind events");
                    let (view, ticket) = events_session.snapshot_and_issue().await;
                    events_session.recompute(ticket, view);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let recv_session = Arc::clone(&session);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    tracing::debug!(user_id = %user_id, message = %text, "WebSocket message received");
                    let parsed = serde_json::from_str::<WsClientMessage>(&text)
                        .map_err(|e| format!("Invalid message: {}", e));
                    let applied = match parsed {
                        Ok(msg) => recv_session.apply(msg).await.map_err(|e| e.to_string()),
                        Err(e) => Err(e),
                    };
                    match applied {
                        Ok((view, ticket)) => recv_session.recompute(ticket, view),
                        Err(message) => {
                            let _ = recv_session.out.send(WsServerMessage::Error { message });
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            event_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
            event_task.abort();
        }
        _ = &mut event_task => {
            send_task.abort();
            recv_task.abort();
        }
    }

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}
