//! # Taxonomia de Erros
//!
//! | Variante | Origem | Recuperável? |
//! |----------|--------|--------------|
//! | [`RecallError::Generation`] | colaborador de IA indisponível ou saída inválida | caller pode repetir |
//! | [`RecallError::NotFound`] | id de conceito inexistente | não |
//! | [`RecallError::InvalidState`] | operação fora de ordem na sessão | não |
//! | [`RecallError::Storage`] | falha de leitura/escrita do snapshot | caller pode repetir |
//!
//! Nenhum erro é repetido internamente. "Nada devido" não é erro: é o
//! estado terminal [`Empty`](crate::orchestrator::SessionState::Empty).

use thiserror::Error;

use crate::core::ConceptId;
use crate::gateway::GenerationError;

/// Falha da camada de persistência.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Erro devolvido por todas as operações do motor.
#[derive(Debug, Error)]
pub enum RecallError {
    #[error("falha na geração: {0}")]
    Generation(#[from] GenerationError),

    #[error("conceito não encontrado: {0}")]
    NotFound(ConceptId),

    #[error("estado inválido: {0}")]
    InvalidState(String),

    #[error("falha de armazenamento: {0}")]
    Storage(#[from] StorageError),
}

impl RecallError {
    /// Rótulo estável usado no corpo JSON das respostas de erro.
    pub fn kind(&self) -> &'static str {
        match self {
            RecallError::Generation(_) => "generation_error",
            RecallError::NotFound(_) => "not_found",
            RecallError::InvalidState(_) => "invalid_state",
            RecallError::Storage(_) => "storage_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecallError>;
