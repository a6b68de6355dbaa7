//! # Estado da Aplicação Web
//!
//! Define o estado compartilhado entre todos os handlers Axum.
//!
//! ```text
//! AppState
//!  ├── orchestrator ── Arc<Orchestrator>        (sem lock: é Sync)
//!  ├── sessions ────── SessionTable             (sessões abertas via HTTP)
//!  └── events_tx ───── broadcast::Sender<StudyEvent>
//! ```
//!
//! O orquestrador não guarda sessões; quem as guarda entre requisições
//! é a [`SessionTable`]. Cada sessão fica atrás de um
//! `tokio::sync::Mutex` próprio, então duas requisições na mesma sessão
//! se serializam sem bloquear as demais.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, Mutex as AsyncMutex};

use crate::orchestrator::{Orchestrator, SessionId, StudySession};
use crate::web::events::StudyEvent;

/// Máximo de sessões abertas mantidas pela [`SessionTable`] padrão.
pub const MAX_OPEN_SESSIONS: usize = 1024;

struct OpenSession {
    /// Ordem de abertura, usada para despejar a mais antiga.
    seq: u64,
    session: Arc<AsyncMutex<StudySession>>,
}

#[derive(Default)]
struct Sessions {
    next_seq: u64,
    open: HashMap<SessionId, OpenSession>,
}

/// Sessões abertas, indexadas por id.
///
/// Tem capacidade fixa: abrir uma sessão com a tabela cheia descarta a
/// aberta há mais tempo. Descartar equivale a abandonar, nada é gravado.
#[derive(Clone)]
pub struct SessionTable {
    inner: Arc<Mutex<Sessions>>,
    capacity: usize,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::with_capacity(MAX_OPEN_SESSIONS)
    }
}

impl SessionTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Sessions::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, session: StudySession) -> SessionId {
        let id = session.id;
        let mut sessions = self.inner.lock();
        while sessions.open.len() >= self.capacity {
            let oldest = sessions
                .open
                .iter()
                .min_by_key(|(_, s)| s.seq)
                .map(|(id, _)| *id);
            let Some(oldest) = oldest else { break };
            sessions.open.remove(&oldest);
            tracing::debug!(session_id = %oldest, "Tabela de sessões cheia, descartando a mais antiga");
        }
        let seq = sessions.next_seq;
        sessions.next_seq += 1;
        sessions.open.insert(
            id,
            OpenSession {
                seq,
                session: Arc::new(AsyncMutex::new(session)),
            },
        );
        id
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<AsyncMutex<StudySession>>> {
        self.inner.lock().open.get(&id).map(|s| s.session.clone())
    }

    /// Remove a sessão. Retorna `false` se ela não existia.
    pub fn remove(&self, id: SessionId) -> bool {
        self.inner.lock().open.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: SessionTable,
    /// Canal broadcast para eventos SSE de estudo.
    pub events_tx: broadcast::Sender<StudyEvent>,
    /// `false` quando o colaborador de IA não tem credenciais.
    pub generator_ready: bool,
}
