//! # ConceptStore — Dono Exclusivo do Estado de Domínio
//!
//! O [`ConceptStore`] guarda todos os conceitos e o log de revisões em
//! memória, com snapshot opcional em disco via
//! [`persistence`](crate::persistence).
//!
//! ## Armazenamento
//!
//! - **Conceitos**: `HashMap<ConceptId, Concept>` — busca O(1) por ID
//! - **Revisões**: `Vec<ReviewRecord>` — log append-only
//! - **Guardas**: `HashMap<ConceptId, Arc<Mutex<()>>>` — um mutex por conceito
//!
//! ## Concorrência
//!
//! ```text
//! commit_review(A)  ──lock(guard A)──read A──scheduler──write A──unlock──
//! commit_review(B)  ──lock(guard B)──read B──scheduler──write B──unlock──   (em paralelo)
//! commit_review(A)                 ╰── espera guard A ──╯
//! ```
//!
//! No máximo **uma** mutação em andamento por conceito; conceitos diferentes
//! não se bloqueiam. O `RwLock` das tabelas é segurado só durante a troca
//! em memória e o flush. Nenhuma chamada ao colaborador de IA acontece com
//! qualquer lock do store segurado: o orquestrador avalia a resposta
//! **antes** de chamar [`commit_review()`](ConceptStore::commit_review).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};

use super::concept::{ClassId, Concept, ConceptId, ReviewRecord};
use crate::error::{RecallError, Result, StorageError};
use crate::persistence::{self, Snapshot};
use crate::scheduler;

#[derive(Default)]
struct Tables {
    concepts: HashMap<ConceptId, Concept>,
    reviews: Vec<ReviewRecord>,
}

impl Tables {
    fn snapshot(&self) -> Snapshot {
        let mut concepts: Vec<Concept> = self.concepts.values().cloned().collect();
        concepts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Snapshot {
            concepts,
            review_sessions: self.reviews.clone(),
        }
    }
}

/// Concept Store em memória com persistência opcional.
pub struct ConceptStore {
    tables: RwLock<Tables>,
    guards: Mutex<HashMap<ConceptId, Arc<Mutex<()>>>>,
    /// `None` → store puramente em memória (testes).
    path: Option<PathBuf>,
}

impl ConceptStore {
    /// Store vazio, sem arquivo de snapshot.
    pub fn in_memory() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            guards: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    /// Abre (ou cria) o store apoiado no snapshot em `path`.
    pub fn open(path: impl Into<PathBuf>) -> std::result::Result<Self, StorageError> {
        let path = path.into();
        let snapshot = persistence::load_snapshot(&path)?;
        let tables = Tables {
            concepts: snapshot.concepts.into_iter().map(|c| (c.id, c)).collect(),
            reviews: snapshot.review_sessions,
        };
        Ok(Self {
            tables: RwLock::new(tables),
            guards: Mutex::new(HashMap::new()),
            path: Some(path),
        })
    }

    pub fn concept_count(&self) -> usize {
        self.tables.read().concepts.len()
    }

    pub fn review_count(&self) -> usize {
        self.tables.read().reviews.len()
    }

    /// Insere conceitos novos e persiste. Devolve os IDs na ordem recebida.
    ///
    /// Se o flush falhar, nenhum dos conceitos fica no store.
    pub fn insert_concepts(&self, concepts: Vec<Concept>) -> Result<Vec<ConceptId>> {
        let ids: Vec<ConceptId> = concepts.iter().map(|c| c.id).collect();
        let mut tables = self.tables.write();
        for concept in concepts {
            tracing::debug!(id = %concept.id, name = %concept.name, "Store: conceito armazenado");
            tables.concepts.insert(concept.id, concept);
        }
        if let Err(e) = self.flush(&tables) {
            for id in &ids {
                tables.concepts.remove(id);
            }
            return Err(e.into());
        }
        Ok(ids)
    }

    pub fn get(&self, id: ConceptId) -> Option<Concept> {
        self.tables.read().concepts.get(&id).cloned()
    }

    /// Todos os conceitos de uma turma, do mais antigo ao mais novo.
    pub fn concepts_in_class(&self, class_id: &str) -> Vec<Concept> {
        let tables = self.tables.read();
        let mut concepts: Vec<Concept> = tables
            .concepts
            .values()
            .filter(|c| c.class_id == class_id)
            .cloned()
            .collect();
        concepts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        concepts
    }

    /// Conceitos devidos em `now`, já na ordem de apresentação
    /// ([`scheduler::due_order`]).
    pub fn due_in_class(&self, class_id: &str, now: DateTime<Utc>) -> Vec<Concept> {
        let tables = self.tables.read();
        let mut due: Vec<Concept> = tables
            .concepts
            .values()
            .filter(|c| c.class_id == class_id && c.is_due(now))
            .cloned()
            .collect();
        due.sort_by(scheduler::due_order);
        due
    }

    /// Nomes (lowercase) já usados na turma: para deduplicar extrações.
    pub fn names_in_class(&self, class_id: &ClassId) -> Vec<String> {
        self.tables
            .read()
            .concepts
            .values()
            .filter(|c| &c.class_id == class_id)
            .map(|c| c.name.to_lowercase())
            .collect()
    }

    /// Histórico de revisões de um conceito, mais recente primeiro.
    pub fn reviews_for(&self, concept_id: ConceptId) -> Vec<ReviewRecord> {
        let tables = self.tables.read();
        let mut reviews: Vec<ReviewRecord> = tables
            .reviews
            .iter()
            .filter(|r| r.concept_id == concept_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        reviews
    }

    /// Read-then-write atômico do estado de domínio de um conceito.
    ///
    /// 1. Adquire o guard do conceito (espera mutações concorrentes do mesmo id)
    /// 2. Lê o estado **atual** do conceito
    /// 3. `apply` muta a cópia e devolve o [`ReviewRecord`] a anexar
    /// 4. Grava conceito + registro e faz o flush
    ///
    /// Se o flush falhar, a troca em memória é desfeita e nada é anexado.
    ///
    /// # Erros
    ///
    /// - [`RecallError::NotFound`] se o conceito não existir
    /// - [`RecallError::Storage`] se o snapshot não puder ser gravado
    pub fn commit_review<F>(&self, id: ConceptId, apply: F) -> Result<Concept>
    where
        F: FnOnce(&mut Concept) -> ReviewRecord,
    {
        let guard = self.guard_for(id);
        let _held = guard.lock();

        let mut concept = self.get(id).ok_or(RecallError::NotFound(id))?;
        let record = apply(&mut concept);

        let mut tables = self.tables.write();
        let previous = tables.concepts.insert(id, concept.clone());
        tables.reviews.push(record);
        if let Err(e) = self.flush(&tables) {
            tables.reviews.pop();
            match previous {
                Some(p) => tables.concepts.insert(id, p),
                None => tables.concepts.remove(&id),
            };
            tracing::error!(concept_id = %id, error = %e, "Falha ao persistir revisão, estado revertido");
            return Err(e.into());
        }
        tracing::debug!(concept_id = %id, mastery = %concept.mastery_level(), "Store: revisão gravada");
        Ok(concept)
    }

    fn guard_for(&self, id: ConceptId) -> Arc<Mutex<()>> {
        self.guards.lock().entry(id).or_default().clone()
    }

    fn flush(&self, tables: &Tables) -> std::result::Result<(), StorageError> {
        match &self.path {
            Some(path) => persistence::save_snapshot(path, &tables.snapshot()),
            None => Ok(()),
        }
    }
}
