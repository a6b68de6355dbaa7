//! # Módulo Core — Tipos Fundamentais do Domínio
//!
//! Tudo no motor de recordação ativa gira em torno destes tipos:
//!
//! - [`MasteryLevel`] — escada de domínio (UNKNOWN → MASTERED)
//! - [`DifficultyLevel`] — dificuldade intrínseca do material
//! - [`Concept`] — unidade revisável, com seu estado de domínio
//! - [`ReviewRecord`] — registro imutável de uma resposta avaliada
//! - [`ConceptStore`] — dono exclusivo do estado, com um guard por conceito
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use active_recall::core::{Concept, ConceptStore, DifficultyLevel};
//! use chrono::Utc;
//!
//! let store = ConceptStore::in_memory();
//! let now = Utc::now();
//! let ids = store
//!     .insert_concepts(vec![Concept::new("bio-101", "Fotossíntese", "Luz → energia química", DifficultyLevel::Basic, now)])
//!     .unwrap();
//! assert_eq!(store.due_in_class("bio-101", now)[0].id, ids[0]);
//! ```

/// Sub-módulo com [`MasteryLevel`] e [`DifficultyLevel`].
pub mod mastery;

/// Sub-módulo com [`Concept`], [`ConceptDraft`] e [`ReviewRecord`].
pub mod concept;

/// Sub-módulo com o [`ConceptStore`].
pub mod store;

pub use concept::{ClassId, Concept, ConceptDraft, ConceptId, ReviewRecord};
pub use mastery::{DifficultyLevel, InvalidLevel, MasteryLevel};
pub use store::ConceptStore;
