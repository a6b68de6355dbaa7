//! # Módulo Web — API HTTP de Estudo
//!
//! Camada fina sobre o [`Orchestrator`](crate::orchestrator::Orchestrator),
//! construída com **Axum** + **SSE**. Toda regra de negócio mora abaixo
//! desta camada; aqui só há extração de parâmetros, a tabela de sessões e
//! o mapeamento de erros para status HTTP.
//!
//! ## Arquitetura Web
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │ Axum Router (este módulo)                                              │
//! │  ├── GET    /api/health                                  → liveness    │
//! │  ├── POST   /api/active-recall/generate-concepts/{class} → extração    │
//! │  ├── POST   /api/active-recall/concepts/{class}          → cadastro    │
//! │  ├── GET    /api/active-recall/concepts/{class}          → listagem    │
//! │  ├── GET    /api/active-recall/study-session/{class}     → abre sessão │
//! │  ├── POST   /api/active-recall/study-session/{id}/answer → responde    │
//! │  ├── POST   /api/active-recall/study-session/{id}/advance→ avança      │
//! │  ├── DELETE /api/active-recall/study-session/{id}        → abandona    │
//! │  ├── POST   /api/active-recall/submit-answer             → sem sessão  │
//! │  ├── GET    /api/active-recall/progress/{class}          → progresso   │
//! │  ├── GET    /api/active-recall/sessions/{concept}        → histórico   │
//! │  └── GET    /events                                      → SSE stream  │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submódulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`state`] | Estado compartilhado (`AppState`, `SessionTable`) |
//! | [`events`] | Enum de eventos SSE de estudo |
//! | [`handlers`] | Handlers Axum para cada rota |

pub mod events;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Cria o router Axum com todas as rotas da aplicação.
///
/// `study-session/{id}` recebe o `class_id` no GET e o `session_id` nas
/// demais rotas: o roteador exige o mesmo nome de parâmetro na mesma
/// posição.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/generate-concepts/{class_id}", post(handlers::generate_concepts))
        .route(
            "/concepts/{class_id}",
            post(handlers::add_concept).get(handlers::list_concepts),
        )
        .route(
            "/study-session/{id}",
            get(handlers::start_session).delete(handlers::abandon),
        )
        .route("/study-session/{id}/answer", post(handlers::answer))
        .route("/study-session/{id}/advance", post(handlers::advance))
        .route("/submit-answer", post(handlers::submit_answer))
        .route("/progress/{class_id}", get(handlers::progress))
        .route("/sessions/{concept_id}", get(handlers::review_history));

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/active-recall", api)
        .route("/events", get(handlers::sse_events))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
