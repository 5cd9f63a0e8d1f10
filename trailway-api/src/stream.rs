use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures_util::{future, stream, Stream, StreamExt};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{error, info, warn};
use trailway_core::{TripEvent, TripId};

use crate::{error::AppError, middleware::AuthUser, state::AppState};

/// GET /v1/trips/{trip_id}/stream
///
/// Sends `INITIAL_STATE` first, then every event of the trip. A subscriber
/// that falls behind the channel buffer has its stream closed and is expected
/// to reconnect for a fresh snapshot.
pub async fn stream_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = state.registry.subscribe(trip_id).await?;
    info!("{} subscribed to trip {}", user.user_id, trip_id);

    let initial = stream::once(future::ready(subscription.initial)).map(|event| Ok(sse_event(&event)));
    let user_id = user.user_id;
    let updates = BroadcastStream::new(subscription.receiver)
        .take_while(move |item| {
            if let Err(BroadcastStreamRecvError::Lagged(missed)) = item {
                warn!("Subscriber {} on trip {} lagged by {} events, closing stream", user_id, trip_id, missed);
                return future::ready(false);
            }
            future::ready(true)
        })
        .filter_map(|item| future::ready(item.ok().map(|event| Ok(sse_event(&event)))));

    Ok(Sse::new(initial.chain(updates)).keep_alive(KeepAlive::default()))
}

fn sse_event(event: &TripEvent) -> Event {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => sse,
        Err(e) => {
            error!("Failed to encode {} event: {}", event.name(), e);
            Event::default().event(event.name()).comment("encoding failed")
        }
    }
}
