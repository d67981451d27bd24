//! Actix Web webhook endpoint receiving Telegram updates.
//!
//! Each update is handed to the bot on its own task and acknowledged right
//! away, so long-running solves never hold the request open.

use std::sync::Arc;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

use crate::handler::Bot;
use crate::solver::PlateSolverApi;
use crate::telegram::types::Update;
use crate::telegram::{FileStore, Notifier};

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Shared state backing HTTP handlers.
pub struct ServerState<S, F, N> {
    pub bot: Arc<Bot<S, F, N>>,
    pub webhook_secret: Option<String>,
}

/// Register the bot routes on an app or test service.
pub fn configure<S, F, N>(cfg: &mut web::ServiceConfig)
where
    S: PlateSolverApi + 'static,
    F: FileStore + 'static,
    N: Notifier + 'static,
{
    cfg.route("/webhook", web::post().to(webhook_handler::<S, F, N>))
        .route("/health", web::get().to(health_handler));
}

async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

fn secret_matches(req: &HttpRequest, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    req.headers()
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|provided| provided == expected)
        .unwrap_or(false)
}

async fn webhook_handler<S, F, N>(
    req: HttpRequest,
    update: web::Json<Update>,
    state: web::Data<ServerState<S, F, N>>,
) -> HttpResponse
where
    S: PlateSolverApi + 'static,
    F: FileStore + 'static,
    N: Notifier + 'static,
{
    if !secret_matches(&req, state.webhook_secret.as_deref()) {
        log::warn!(
            "Rejected webhook call from {:?}: bad secret token",
            req.peer_addr()
        );
        return HttpResponse::Unauthorized().finish();
    }

    let update = update.into_inner();
    let update_id = update.update_id;
    let bot = Arc::clone(&state.bot);

    actix_web::rt::spawn(async move {
        let outcome = bot.handle_update(update).await;
        log::debug!("Update {} handled: {:?}", update_id, outcome);
    });

    HttpResponse::Ok().finish()
}

/// Serve the webhook until the process is asked to stop.
pub async fn run_server<S, F, N>(
    bot: Arc<Bot<S, F, N>>,
    webhook_secret: Option<String>,
    port: u16,
) -> std::io::Result<()>
where
    S: PlateSolverApi + Send + Sync + 'static,
    F: FileStore + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    let state = web::Data::new(ServerState {
        bot,
        webhook_secret,
    });

    log::info!("Listening for webhook updates on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(configure::<S, F, N>)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
