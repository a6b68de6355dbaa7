//! # Eventos SSE de Estudo
//!
//! Define o enum [`StudyEvent`]: tudo o que o motor anuncia enquanto
//! gera conceitos e conduz sessões, enviado em tempo real via
//! Server-Sent Events (`GET /events`).
//!
//! ## Ciclo de Vida dos Eventos
//!
//! ```text
//! ConceptsGenerated
//! QuestionPresented → AnswerEvaluated → [MasteryChanged] → QuestionPresented → ... → SessionEmpty
//! ```
//!
//! ## Serialização
//!
//! Usa `#[serde(tag = "type")]` para produzir JSON com discriminador:
//!
//! ```json
//! { "type": "MasteryChanged", "concept_id": "uuid", "from": "LEARNING", "to": "FAMILIAR" }
//! ```

use serde::Serialize;

/// Evento emitido pelo orquestrador, enviado via SSE ao frontend.
///
/// Publicar sem assinantes não é erro: o evento simplesmente se perde.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum StudyEvent {
    /// Conceitos novos extraídos de material de estudo.
    ConceptsGenerated {
        class_id: String,
        /// Quantos conceitos foram efetivamente criados (após deduplicação).
        count: usize,
    },

    /// Uma pergunta foi gerada e aguarda resposta.
    QuestionPresented {
        session_id: String,
        concept_id: String,
        /// "recall", "application" ou "synthesis".
        question_type: String,
    },

    /// Uma resposta foi avaliada e o progresso gravado.
    AnswerEvaluated {
        concept_id: String,
        correct: bool,
        score: u8,
        /// Próxima revisão (RFC 3339).
        next_review: String,
    },

    /// O nível de domínio mudou (promoção ou rebaixamento).
    MasteryChanged {
        concept_id: String,
        name: String,
        from: String,
        to: String,
    },

    /// A sessão não encontrou mais conceitos devidos.
    SessionEmpty {
        session_id: String,
        class_id: String,
    },
}
