//! # Handlers HTTP — Os Endpoints de Estudo
//!
//! Cada função pública neste módulo é um handler Axum, mapeado a uma
//! rota em [`super::create_router()`]. Todos respondem JSON, exceto o
//! stream SSE.
//!
//! ## Padrão de Resposta
//!
//! | Handler | Método | Retorno |
//! |---------|--------|---------|
//! | `health` | GET | `{ status, generator_ready, concepts }` |
//! | `generate_concepts` | POST | `{ concept_ids, count }` |
//! | `add_concept` / `list_concepts` | POST / GET | [`ConceptView`] |
//! | `start_session` | GET | [`SessionView`] |
//! | `answer` | POST | [`AnswerResponse`] |
//! | `advance` | POST | [`SessionView`] |
//! | `abandon` | DELETE | 204 |
//! | `submit_answer` | POST | [`ReviewOutcome`] |
//! | `progress` | GET | [`Progress`] |
//! | `review_history` | GET | `Vec<ReviewRecord>` |
//! | `sse_events` | GET | SSE stream |
//!
//! ## Erros
//!
//! [`ApiError`] traduz a taxonomia de [`RecallError`] em status HTTP com
//! corpo `{ "error": kind, "message": texto }`:
//!
//! | Erro | Status |
//! |------|--------|
//! | `NotFound` / sessão inexistente | 404 |
//! | `InvalidState` | 409 |
//! | `Generation` | 502 |
//! | `Storage` | 500 |
//! | validação da requisição | 400 |

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use super::state::AppState;
use crate::core::{Concept, ConceptDraft, ConceptId, DifficultyLevel, ReviewRecord};
use crate::error::RecallError;
use crate::gateway::Question;
use crate::orchestrator::{ReviewOutcome, SessionId, SessionState, StudySession};
use crate::progress::Progress;

// ─── Erros ───────────────────────────────────────────────────────

/// Erro de handler, convertido em resposta JSON.
#[derive(Debug)]
pub enum ApiError {
    Recall(RecallError),
    SessionNotFound(SessionId),
    BadRequest(String),
}

impl From<RecallError> for ApiError {
    fn from(e: RecallError) -> Self {
        ApiError::Recall(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Recall(e) => {
                let status = match &e {
                    RecallError::NotFound(_) => StatusCode::NOT_FOUND,
                    RecallError::InvalidState(_) => StatusCode::CONFLICT,
                    RecallError::Generation(_) => StatusCode::BAD_GATEWAY,
                    RecallError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %e, "Falha ao processar requisição");
                }
                (status, e.kind(), e.to_string())
            }
            ApiError::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("sessão não encontrada: {id}"),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ─── DTOs ────────────────────────────────────────────────────────

/// Conceito serializado para o frontend.
///
/// Níveis vão como inteiro (contrato da tabela) e como nome legível.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConceptView {
    pub id: ConceptId,
    pub class_id: String,
    pub name: String,
    pub content: String,
    pub mastery_level: u8,
    pub mastery_name: String,
    pub difficulty_level: u8,
    pub difficulty_name: String,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: DateTime<Utc>,
    pub review_count: u32,
    pub correct_streak: u32,
}

impl From<&Concept> for ConceptView {
    fn from(c: &Concept) -> Self {
        Self {
            id: c.id,
            class_id: c.class_id.clone(),
            name: c.name.clone(),
            content: c.content.clone(),
            mastery_level: c.mastery_level().index(),
            mastery_name: c.mastery_level().name().to_string(),
            difficulty_level: c.difficulty_level.into(),
            difficulty_name: c.difficulty_level.name().to_string(),
            last_reviewed: c.last_reviewed(),
            next_review: c.next_review(),
            review_count: c.review_count(),
            correct_streak: c.correct_streak(),
        }
    }
}

/// Retrato de uma sessão de estudo.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub class_id: String,
    /// `idle`, `awaiting_answer`, `evaluated`, `failed` ou `empty`.
    pub state: String,
    pub answered: u32,
    pub concepts_due: usize,
    pub position: u32,
    pub started_at: DateTime<Utc>,
    pub concept: Option<ConceptView>,
    pub question: Option<Question>,
    /// Mensagem da última falha, no estado `failed`.
    pub error: Option<String>,
}

impl From<&StudySession> for SessionView {
    fn from(s: &StudySession) -> Self {
        let current = s.current();
        let error = match s.state() {
            SessionState::Failed { error, .. } => Some(error.clone()),
            _ => None,
        };
        Self {
            session_id: s.id,
            class_id: s.class_id.clone(),
            state: s.state().name().to_string(),
            answered: s.answered,
            concepts_due: s.concepts_due,
            position: s.current_position(),
            started_at: s.started_at,
            concept: current.map(|(c, _)| ConceptView::from(c)),
            question: current.map(|(_, q)| q.clone()),
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub generator_ready: bool,
    pub concepts: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub material: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub concept_ids: Vec<ConceptId>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct AddConceptRequest {
    pub name: String,
    pub content: String,
    /// Nome (`"ADVANCED"`) ou ausente para `BASIC`.
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub outcome: ReviewOutcome,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub concept_id: ConceptId,
    pub question: String,
    pub answer: String,
}

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("'{field}' não pode ser vazio")));
    }
    Ok(())
}

// ─── Handlers ────────────────────────────────────────────────────

/// GET `/api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        generator_ready: state.generator_ready,
        concepts: state.orchestrator.store().concept_count(),
    })
}

/// POST `/api/active-recall/generate-concepts/{class_id}`
///
/// Extrai conceitos do material enviado. Nomes já existentes na turma
/// são ignorados, então o mesmo material pode ser reenviado.
pub async fn generate_concepts(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let concept_ids = state
        .orchestrator
        .generate_concepts(&class_id, &req.material)
        .await?;
    Ok(Json(GenerateResponse {
        count: concept_ids.len(),
        concept_ids,
    }))
}

/// POST `/api/active-recall/concepts/{class_id}`
pub async fn add_concept(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Json(req): Json<AddConceptRequest>,
) -> ApiResult<(StatusCode, Json<ConceptView>)> {
    require_text("name", &req.name)?;
    require_text("content", &req.content)?;
    let difficulty = match req.difficulty.as_deref() {
        None => DifficultyLevel::Basic,
        Some(name) => DifficultyLevel::parse(name)
            .ok_or_else(|| ApiError::BadRequest(format!("dificuldade inválida: {name}")))?,
    };

    let id = state.orchestrator.add_concept(
        &class_id,
        ConceptDraft {
            name: req.name.trim().to_string(),
            content: req.content,
            difficulty,
        },
    )?;
    let concept = state
        .orchestrator
        .store()
        .get(id)
        .ok_or(RecallError::NotFound(id))?;
    Ok((StatusCode::CREATED, Json(ConceptView::from(&concept))))
}

/// GET `/api/active-recall/concepts/{class_id}`
pub async fn list_concepts(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> Json<Vec<ConceptView>> {
    let concepts = state.orchestrator.concepts(&class_id);
    Json(concepts.iter().map(ConceptView::from).collect())
}

/// GET `/api/active-recall/study-session/{class_id}`
///
/// Abre uma sessão e já devolve a primeira pergunta. Sessões que nascem
/// vazias não entram na tabela.
pub async fn start_session(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
) -> ApiResult<Json<SessionView>> {
    let session = state.orchestrator.start_session(&class_id).await?;
    let view = SessionView::from(&session);
    if session.state() != &SessionState::Empty {
        state.sessions.insert(session);
    }
    Ok(Json(view))
}

/// POST `/api/active-recall/study-session/{session_id}/answer`
pub async fn answer(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<Json<AnswerResponse>> {
    require_text("answer", &req.answer)?;
    let handle = state
        .sessions
        .get(session_id)
        .ok_or(ApiError::SessionNotFound(session_id))?;
    let mut session = handle.lock().await;

    let outcome = state.orchestrator.submit_answer(&mut session, &req.answer).await?;
    Ok(Json(AnswerResponse {
        outcome,
        session: SessionView::from(&*session),
    }))
}

/// POST `/api/active-recall/study-session/{session_id}/advance`
///
/// Em `Evaluated` avança; em `Idle` (geração anterior falhou) tenta de novo.
/// Quando a sessão chega a `Empty` ela sai da tabela.
pub async fn advance(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<SessionView>> {
    let handle = state
        .sessions
        .get(session_id)
        .ok_or(ApiError::SessionNotFound(session_id))?;
    let mut session = handle.lock().await;

    if session.state() == &SessionState::Idle {
        state.orchestrator.resume(&mut session).await?;
    } else {
        state.orchestrator.advance(&mut session).await?;
    }
    if session.state() == &SessionState::Empty {
        state.sessions.remove(session_id);
    }
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE `/api/active-recall/study-session/{session_id}`
///
/// Abandonar não grava nada: o conceito em foco continua devido.
pub async fn abandon(State(state): State<AppState>, Path(session_id): Path<SessionId>) -> ApiResult<StatusCode> {
    if !state.sessions.remove(session_id) {
        return Err(ApiError::SessionNotFound(session_id));
    }
    tracing::debug!(session_id = %session_id, "Sessão abandonada");
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/active-recall/submit-answer`
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> ApiResult<Json<ReviewOutcome>> {
    require_text("question", &req.question)?;
    require_text("answer", &req.answer)?;
    let outcome = state
        .orchestrator
        .submit_answer_for(req.concept_id, &req.question, &req.answer)
        .await?;
    Ok(Json(outcome))
}

/// GET `/api/active-recall/progress/{class_id}`
pub async fn progress(State(state): State<AppState>, Path(class_id): Path<String>) -> Json<Progress> {
    Json(state.orchestrator.get_progress(&class_id))
}

/// GET `/api/active-recall/sessions/{concept_id}`: histórico de revisões.
pub async fn review_history(
    State(state): State<AppState>,
    Path(concept_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ReviewRecord>>> {
    Ok(Json(state.orchestrator.review_history(concept_id)?))
}

/// GET `/events`: Stream SSE de [`StudyEvent`](super::events::StudyEvent).
///
/// ## Keep-Alive
///
/// Envia keep-alive a cada 15s para manter a conexão viva
/// (proxies HTTP frequentemente fecham conexões idle).
///
/// ## Lagged Messages
///
/// Se o subscriber ficar para trás (buffer cheio), mensagens
/// são silenciosamente descartadas (filter_map retorna None).
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(SseEvent::default().data(data)))
            }
            Err(_) => None, // mensagens atrasadas são descartadas
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
