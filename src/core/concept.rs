//! # Concept — Unidade Revisável de Estudo
//!
//! Um [`Concept`] é a menor unidade que o motor de recordação ativa agenda
//! e avalia: um nome curto, o texto-fonte que ancora as perguntas, e a
//! trajetória de domínio do estudante.
//!
//! ## Campos Principais
//!
//! | Campo | Tipo | Descrição |
//! |-------|------|-----------|
//! | `id` | UUID | Identificador estável, nunca reutilizado |
//! | `class_id` | String | Turma/escopo ao qual o conceito pertence |
//! | `name` | String | Rótulo curto |
//! | `content` | String | Texto-fonte (imutável após criação) |
//! | `mastery_level` | [MasteryLevel] | Degrau atual de domínio |
//! | `difficulty_level` | [DifficultyLevel] | Dificuldade intrínseca |
//! | `next_review` | DateTime | Devido quando `next_review <= agora` |
//! | `correct_streak` | u32 | Acertos consecutivos desde o último erro |
//!
//! ## Invariante
//!
//! Os campos de progresso (`mastery_level`, `next_review`, `last_reviewed`,
//! `review_count`, `correct_streak`, `unaided_streak`) são privados: só
//! mudam via [`Concept::apply_review()`], que recebe uma
//! [`Transition`] já calculada pelo [`scheduler`](crate::scheduler).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use active_recall::core::{Concept, DifficultyLevel, MasteryLevel};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let conceito = Concept::new("bio-101", "Fotossíntese", "Conversão de luz em energia química", DifficultyLevel::Basic, now);
//! assert_eq!(conceito.mastery_level(), MasteryLevel::Unknown);
//! assert!(conceito.is_due(now));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mastery::{DifficultyLevel, MasteryLevel};
use crate::scheduler::{StreakState, Transition};

/// Alias de tipo para o identificador de um [Concept].
pub type ConceptId = Uuid;

/// Identificador da turma (escopo): atribuído pela camada de CRUD externa.
pub type ClassId = String;

/// Conceito revisável, com seu estado de domínio.
///
/// Serializado com os nomes de campo da tabela `concepts`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Identificador único (UUID v4).
    pub id: ConceptId,
    /// Escopo ao qual o conceito pertence.
    pub class_id: ClassId,
    /// Rótulo curto, ex: "Fotossíntese".
    pub name: String,
    /// Texto-fonte usado para ancorar a geração de perguntas.
    pub content: String,
    /// Dificuldade intrínseca: não muda com as revisões.
    pub difficulty_level: DifficultyLevel,
    /// Momento da criação.
    pub created_at: DateTime<Utc>,

    mastery_level: MasteryLevel,
    last_reviewed: Option<DateTime<Utc>>,
    next_review: DateTime<Utc>,
    review_count: u32,
    correct_streak: u32,
    /// Acertos consecutivos **sem dicas**: subcontador do portão de promoção.
    #[serde(default)]
    unaided_streak: u32,
}

impl Concept {
    /// Cria um conceito novo: `UNKNOWN`, sem revisões, devido imediatamente.
    pub fn new(
        class_id: impl Into<ClassId>,
        name: impl Into<String>,
        content: impl Into<String>,
        difficulty_level: DifficultyLevel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_id: class_id.into(),
            name: name.into(),
            content: content.into(),
            difficulty_level,
            created_at: now,
            mastery_level: MasteryLevel::Unknown,
            last_reviewed: None,
            next_review: now,
            review_count: 0,
            correct_streak: 0,
            unaided_streak: 0,
        }
    }

    pub fn mastery_level(&self) -> MasteryLevel {
        self.mastery_level
    }

    pub fn last_reviewed(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed
    }

    pub fn next_review(&self) -> DateTime<Utc> {
        self.next_review
    }

    pub fn review_count(&self) -> u32 {
        self.review_count
    }

    pub fn correct_streak(&self) -> u32 {
        self.correct_streak
    }

    pub fn unaided_streak(&self) -> u32 {
        self.unaided_streak
    }

    /// Contadores de sequência no formato que o scheduler consome.
    pub fn streak(&self) -> StreakState {
        StreakState {
            correct: self.correct_streak,
            unaided: self.unaided_streak,
        }
    }

    /// `true` quando `next_review <= now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// Aplica o resultado de uma revisão avaliada.
    ///
    /// Único ponto de mutação do progresso. `next_review` vem pronto da
    /// transição (derivado do nível **resultante**), nunca do chamador.
    pub fn apply_review(&mut self, transition: &Transition, submitted_at: DateTime<Utc>) {
        self.mastery_level = transition.mastery;
        self.correct_streak = transition.streak.correct;
        self.unaided_streak = transition.streak.unaided;
        self.next_review = transition.next_review(submitted_at);
        self.last_reviewed = Some(submitted_at);
        self.review_count += 1;
    }

    /// Conceito com progresso arbitrário, para montar cenários de teste.
    #[cfg(test)]
    pub(crate) fn with_progress(
        mut self,
        mastery_level: MasteryLevel,
        streak: StreakState,
        next_review: DateTime<Utc>,
    ) -> Self {
        self.mastery_level = mastery_level;
        self.correct_streak = streak.correct;
        self.unaided_streak = streak.unaided;
        self.next_review = next_review;
        self
    }
}

/// Conceito ainda sem identidade, como sai da extração de material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConceptDraft {
    pub name: String,
    pub content: String,
    pub difficulty: DifficultyLevel,
}

/// Registro imutável de uma resposta avaliada (tabela `review_sessions`).
///
/// Append-only: serve apenas para histórico e auditoria. O scheduler
/// nunca lê nem altera estes registros.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: Uuid,
    pub concept_id: ConceptId,
    pub question: String,
    pub user_answer: String,
    pub correct: bool,
    /// Nota informativa 0..100 dada pelo avaliador.
    pub score: u8,
    pub feedback: String,
    pub hints_used: u32,
    pub timestamp: DateTime<Utc>,
}
