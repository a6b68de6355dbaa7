//! # Orquestrador — Ciclo de Estudo
//!
//! O [`Orchestrator`] conduz o ciclo pergunta → resposta → avaliação →
//! agendamento, coordenando o [`ConceptStore`], o [`QuestionGateway`] e o
//! [`scheduler`].
//!
//! ## Máquina de Estados da Sessão
//!
//! ```text
//!            start_session
//!   Idle ──────────────────┬──▶ Empty            (nada devido)
//!    ▲                     └──▶ AwaitingAnswer   (pergunta gerada)
//!    │                               │ submit_answer
//!    │ advance                       ├──▶ Evaluated (revisão gravada)
//!    │                               └──▶ Failed    (gateway falhou)
//!    │                                      │ submit_answer (retry)
//!    └──────────── Evaluated ◀──────────────┘
//! ```
//!
//! O estado vive em um [`StudySession`] que o **chamador** guarda entre
//! chamadas; não existe sessão global. Abandonar uma sessão não deixa
//! rastro: só uma avaliação bem-sucedida muda o estado de um conceito.
//!
//! ## Regras de Consistência
//!
//! - A avaliação acontece **sem** lock algum do store
//! - O read-then-write do progresso acontece dentro de
//!   [`ConceptStore::commit_review()`], sob o guard do conceito
//! - Falha do gateway ⇒ nenhum registro de revisão, nenhum contador alterado

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::{ClassId, Concept, ConceptDraft, ConceptId, ConceptStore, MasteryLevel, ReviewRecord};
use crate::error::{RecallError, Result, StorageError};
use crate::gateway::{question_type_for, Evaluation, Question, QuestionGateway};
use crate::progress::{self, Progress};
use crate::scheduler;
use crate::web::events::StudyEvent;

pub type SessionId = Uuid;

/// Fonte de tempo do orquestrador.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Relógio do sistema (`Utc::now()`).
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Progresso de um conceito logo após uma revisão.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConceptProgress {
    pub concept_id: ConceptId,
    pub previous_mastery: MasteryLevel,
    pub mastery_level: MasteryLevel,
    pub correct_streak: u32,
    pub review_count: u32,
    pub next_review: DateTime<Utc>,
}

/// Resultado de uma resposta avaliada e gravada.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub review_id: Uuid,
    pub evaluation: Evaluation,
    pub progress: ConceptProgress,
}

/// Estado de uma sessão de estudo.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    AwaitingAnswer {
        concept: Concept,
        question: Question,
    },
    Evaluated {
        concept: Concept,
        question: Question,
        outcome: ReviewOutcome,
    },
    /// O gateway falhou ao avaliar; a mesma pergunta pode ser respondida de novo.
    Failed {
        concept: Concept,
        question: Question,
        error: String,
    },
    /// Nenhum conceito devido no escopo. Terminal.
    Empty,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingAnswer { .. } => "awaiting_answer",
            SessionState::Evaluated { .. } => "evaluated",
            SessionState::Failed { .. } => "failed",
            SessionState::Empty => "empty",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uma sessão de estudo sobre uma turma, mantida pelo chamador.
#[derive(Clone, Debug)]
pub struct StudySession {
    pub id: SessionId,
    pub class_id: ClassId,
    pub started_at: DateTime<Utc>,
    /// Respostas avaliadas com sucesso nesta sessão.
    pub answered: u32,
    /// Conceitos devidos na última seleção.
    pub concepts_due: usize,
    state: SessionState,
}

impl StudySession {
    fn new(class_id: ClassId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_id,
            started_at: now,
            answered: 0,
            concepts_due: 0,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Conceito e pergunta em foco, se houver.
    pub fn current(&self) -> Option<(&Concept, &Question)> {
        match &self.state {
            SessionState::AwaitingAnswer { concept, question }
            | SessionState::Evaluated { concept, question, .. }
            | SessionState::Failed { concept, question, .. } => Some((concept, question)),
            SessionState::Idle | SessionState::Empty => None,
        }
    }

    /// Posição 1-based da pergunta atual dentro da sessão.
    pub fn current_position(&self) -> u32 {
        match self.state {
            SessionState::Evaluated { .. } => self.answered,
            _ => self.answered + 1,
        }
    }
}

/// Orquestrador do ciclo de recordação ativa.
pub struct Orchestrator {
    store: Arc<ConceptStore>,
    gateway: Arc<QuestionGateway>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<StudyEvent>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ConceptStore>,
        gateway: Arc<QuestionGateway>,
        events: broadcast::Sender<StudyEvent>,
    ) -> Self {
        Self {
            store,
            gateway,
            clock: Arc::new(SystemClock),
            events,
        }
    }

    /// Substitui o relógio (usado nos testes).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<ConceptStore> {
        &self.store
    }

    fn publish(&self, event: StudyEvent) {
        // sem assinantes o send falha; o evento é descartável
        let _ = self.events.send(event);
    }

    // ─── Conceitos ────────────────────────────────────────────────

    /// Extrai conceitos do material e cria os que ainda não existem na turma.
    ///
    /// Nomes já presentes (case-insensitive) e repetidos dentro do lote são
    /// ignorados. Material vazio não consulta o colaborador.
    pub async fn generate_concepts(&self, class_id: &str, material: &str) -> Result<Vec<ConceptId>> {
        if material.trim().is_empty() {
            return Ok(Vec::new());
        }
        let drafts = self.gateway.extract_concepts(material).await?;

        let class_id = class_id.to_string();
        let mut seen = self.store.names_in_class(&class_id);
        let now = self.clock.now();
        let mut concepts = Vec::new();
        for draft in drafts {
            let key = draft.name.to_lowercase();
            if seen.contains(&key) {
                tracing::debug!(name = %draft.name, "Conceito já existe na turma, ignorando");
                continue;
            }
            seen.push(key);
            concepts.push(Concept::new(class_id.clone(), draft.name, draft.content, draft.difficulty, now));
        }

        let ids = self.store.insert_concepts(concepts)?;
        tracing::info!(class_id = %class_id, count = ids.len(), "Conceitos gerados");
        self.publish(StudyEvent::ConceptsGenerated {
            class_id,
            count: ids.len(),
        });
        Ok(ids)
    }

    /// Registra manualmente um conceito na turma.
    pub fn add_concept(&self, class_id: &str, draft: ConceptDraft) -> Result<ConceptId> {
        let concept = Concept::new(class_id, draft.name, draft.content, draft.difficulty, self.clock.now());
        let id = concept.id;
        self.store.insert_concepts(vec![concept])?;
        tracing::info!(class_id = %class_id, concept_id = %id, "Conceito adicionado");
        Ok(id)
    }

    pub fn concepts(&self, class_id: &str) -> Vec<Concept> {
        self.store.concepts_in_class(class_id)
    }

    pub fn review_history(&self, concept_id: ConceptId) -> Result<Vec<ReviewRecord>> {
        if self.store.get(concept_id).is_none() {
            return Err(RecallError::NotFound(concept_id));
        }
        Ok(self.store.reviews_for(concept_id))
    }

    pub fn get_progress(&self, class_id: &str) -> Progress {
        progress::get_progress(&self.store, class_id, self.clock.now())
    }

    // ─── Sessão ───────────────────────────────────────────────────

    /// Abre uma sessão e seleciona o primeiro conceito devido.
    ///
    /// Sai em `AwaitingAnswer`, ou em `Empty` se nada estiver devido.
    ///
    /// # Erros
    ///
    /// [`RecallError::Generation`] se a pergunta não puder ser gerada.
    /// Nenhuma escrita acontece em nenhum dos casos.
    pub async fn start_session(&self, class_id: &str) -> Result<StudySession> {
        let mut session = StudySession::new(class_id.to_string(), self.clock.now());
        self.select_next(&mut session).await?;
        Ok(session)
    }

    /// Avalia a resposta à pergunta atual e grava o novo progresso.
    ///
    /// Aceito em `AwaitingAnswer` e em `Failed` (retry da mesma pergunta).
    /// Em caso de erro a sessão vai para `Failed` e o conceito fica intacto.
    pub async fn submit_answer(&self, session: &mut StudySession, answer: &str) -> Result<ReviewOutcome> {
        let (concept, question) = match &session.state {
            SessionState::AwaitingAnswer { concept, question }
            | SessionState::Failed { concept, question, .. } => (concept.clone(), question.clone()),
            other => {
                return Err(RecallError::InvalidState(format!(
                    "submit_answer não é permitido no estado '{other}'"
                )))
            }
        };

        match self.review(&concept, &question, answer).await {
            Ok(outcome) => {
                session.answered += 1;
                session.state = SessionState::Evaluated {
                    concept,
                    question,
                    outcome: outcome.clone(),
                };
                Ok(outcome)
            }
            Err(e) => {
                session.state = SessionState::Failed {
                    concept,
                    question,
                    error: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Passa para o próximo conceito devido da mesma turma.
    ///
    /// Só é aceito em `Evaluated`. Se a geração falhar, a sessão fica em
    /// `Idle` e `advance` pode ser chamado de novo.
    pub async fn advance(&self, session: &mut StudySession) -> Result<()> {
        if !matches!(session.state, SessionState::Evaluated { .. }) {
            return Err(RecallError::InvalidState(format!(
                "advance não é permitido no estado '{}'",
                session.state
            )));
        }
        session.state = SessionState::Idle;
        self.select_next(session).await
    }

    /// Retoma uma sessão deixada em `Idle` por falha de geração.
    pub async fn resume(&self, session: &mut StudySession) -> Result<()> {
        if session.state != SessionState::Idle {
            return Err(RecallError::InvalidState(format!(
                "resume não é permitido no estado '{}'",
                session.state
            )));
        }
        self.select_next(session).await
    }

    /// Envio sem sessão: avalia `answer` para `question` sobre o conceito.
    ///
    /// # Erros
    ///
    /// [`RecallError::NotFound`] se o conceito não existir.
    pub async fn submit_answer_for(
        &self,
        concept_id: ConceptId,
        question_text: &str,
        answer: &str,
    ) -> Result<ReviewOutcome> {
        let concept = self
            .store
            .get(concept_id)
            .ok_or(RecallError::NotFound(concept_id))?;
        let question = Question {
            text: question_text.to_string(),
            question_type: question_type_for(concept.mastery_level(), concept.difficulty_level),
            difficulty: concept.difficulty_level,
        };
        self.review(&concept, &question, answer).await
    }

    async fn select_next(&self, session: &mut StudySession) -> Result<()> {
        let due = self.store.due_in_class(&session.class_id, self.clock.now());
        session.concepts_due = due.len();

        let Some(concept) = due.into_iter().next() else {
            tracing::info!(session_id = %session.id, class_id = %session.class_id, "Nenhum conceito devido");
            session.state = SessionState::Empty;
            self.publish(StudyEvent::SessionEmpty {
                session_id: session.id.to_string(),
                class_id: session.class_id.clone(),
            });
            return Ok(());
        };

        let question = self
            .gateway
            .generate_question(&concept, concept.mastery_level(), concept.difficulty_level)
            .await?;

        self.publish(StudyEvent::QuestionPresented {
            session_id: session.id.to_string(),
            concept_id: concept.id.to_string(),
            question_type: question.question_type.to_string(),
        });
        session.state = SessionState::AwaitingAnswer { concept, question };
        Ok(())
    }

    /// Avalia (sem lock) e então aplica o scheduler sob o guard do conceito.
    async fn review(&self, concept: &Concept, question: &Question, answer: &str) -> Result<ReviewOutcome> {
        let evaluation = self.gateway.evaluate_answer(concept, question, answer).await?;

        let submitted_at = self.clock.now();
        let record = ReviewRecord {
            id: Uuid::new_v4(),
            concept_id: concept.id,
            question: question.text.clone(),
            user_answer: answer.to_string(),
            correct: evaluation.correct,
            score: evaluation.score,
            feedback: evaluation.feedback.clone(),
            hints_used: evaluation.hints_used,
            timestamp: submitted_at,
        };
        let review_id = record.id;

        // o flush do snapshot é I/O síncrono: fora das threads do runtime
        let store = self.store.clone();
        let (updated, previous_mastery, promoted) = tokio::task::spawn_blocking(move || {
            let mut previous_mastery = MasteryLevel::Unknown;
            let mut promoted = false;
            let updated = store.commit_review(record.concept_id, |current| {
                previous_mastery = current.mastery_level();
                let transition = scheduler::next_state(
                    current.mastery_level(),
                    current.streak(),
                    record.correct,
                    record.hints_used,
                );
                promoted = transition.promoted;
                current.apply_review(&transition, submitted_at);
                record
            })?;
            Ok::<_, RecallError>((updated, previous_mastery, promoted))
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        self.publish(StudyEvent::AnswerEvaluated {
            concept_id: updated.id.to_string(),
            correct: evaluation.correct,
            score: evaluation.score,
            next_review: updated.next_review().to_rfc3339(),
        });
        if updated.mastery_level() != previous_mastery {
            tracing::info!(
                concept_id = %updated.id,
                from = %previous_mastery,
                to = %updated.mastery_level(),
                "{}",
                if promoted { "Conceito promovido" } else { "Conceito rebaixado" }
            );
            self.publish(StudyEvent::MasteryChanged {
                concept_id: updated.id.to_string(),
                name: updated.name.clone(),
                from: previous_mastery.to_string(),
                to: updated.mastery_level().to_string(),
            });
        }

        Ok(ReviewOutcome {
            review_id,
            evaluation,
            progress: ConceptProgress {
                concept_id: updated.id,
                previous_mastery,
                mastery_level: updated.mastery_level(),
                correct_streak: updated.correct_streak(),
                review_count: updated.review_count(),
                next_review: updated.next_review(),
            },
        })
    }
}
