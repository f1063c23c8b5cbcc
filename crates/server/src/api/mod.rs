pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tracking;
pub mod ws;

pub use routes::create_router;
pub use ws::{BroadcastPresenter, WsBroadcaster, WsMessage};
