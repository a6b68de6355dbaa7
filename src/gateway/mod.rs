//! # Gateway de Perguntas e Avaliação
//!
//! O [`QuestionGateway`] é o invólucro de protocolo em volta do
//! colaborador externo de geração de texto. Ele não sabe **como** o texto
//! é gerado: só sabe montar pedidos e validar respostas.
//!
//! ```text
//! Orchestrator
//!   │ generate_question / evaluate_answer / extract_concepts
//!   ▼
//! QuestionGateway ──prompts──▶ CompletionBackend (trait)
//!   ▲                              │
//!   └──────── ResponseParser ◀─────┘  (texto → JSON validado)
//! ```
//!
//! ## Escolha do Tipo de Pergunta
//!
//! | Domínio | BASIC / INTERMEDIATE | ADVANCED / EXPERT |
//! |---------|----------------------|-------------------|
//! | UNKNOWN, LEARNING | recall | recall |
//! | FAMILIAR | recall | application |
//! | PROFICIENT | application | synthesis |
//! | MASTERED | synthesis | synthesis |
//!
//! ## Falhas
//!
//! Colaborador inacessível, HTTP de erro ou JSON inválido viram
//! [`GenerationError`]. Nunca há pergunta de reserva nem correção local por
//! comparação de strings: o avaliador é a única autoridade sobre `correct`.

pub mod llm;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Concept, ConceptDraft, DifficultyLevel, MasteryLevel};
use prompts::ResponseParser;

/// Falha ao falar com o colaborador de IA.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("colaborador de IA não configurado: {0}")]
    NotConfigured(&'static str),

    #[error("requisição falhou: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("resposta malformada: {0}")]
    Malformed(String),
}

/// Serviço externo de completion de texto.
///
/// A implementação de produção é [`llm::LlmClient`]; os testes usam um
/// backend roteirizado.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Envia um par (system, user) e devolve o texto gerado.
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

/// Estilo cognitivo da pergunta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Recall,
    Application,
    Synthesis,
}

impl QuestionType {
    pub fn name(self) -> &'static str {
        match self {
            QuestionType::Recall => "recall",
            QuestionType::Application => "application",
            QuestionType::Synthesis => "synthesis",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "recall" => Some(QuestionType::Recall),
            "application" => Some(QuestionType::Application),
            "synthesis" => Some(QuestionType::Synthesis),
            _ => None,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tipo de pergunta adequado ao domínio atual (veja a tabela do módulo).
pub fn question_type_for(mastery: MasteryLevel, difficulty: DifficultyLevel) -> QuestionType {
    let demanding = difficulty >= DifficultyLevel::Advanced;
    match mastery {
        MasteryLevel::Unknown | MasteryLevel::Learning => QuestionType::Recall,
        MasteryLevel::Familiar if demanding => QuestionType::Application,
        MasteryLevel::Familiar => QuestionType::Recall,
        MasteryLevel::Proficient if demanding => QuestionType::Synthesis,
        MasteryLevel::Proficient => QuestionType::Application,
        MasteryLevel::Mastered => QuestionType::Synthesis,
    }
}

/// Pergunta apresentada ao estudante.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub difficulty: DifficultyLevel,
}

/// Veredito do avaliador sobre uma resposta livre.
///
/// Só `correct` alimenta o scheduler; `score` e `feedback` são informativos.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: bool,
    pub score: u8,
    pub feedback: String,
    pub hints_used: u32,
}

/// Invólucro de protocolo em volta do [`CompletionBackend`].
pub struct QuestionGateway {
    backend: Arc<dyn CompletionBackend>,
    parser: ResponseParser,
}

impl QuestionGateway {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            parser: ResponseParser::new(),
        }
    }

    /// Gera uma pergunta para o conceito no domínio/dificuldade dados.
    ///
    /// # Erros
    ///
    /// [`GenerationError`] se o colaborador falhar, se a resposta não trouxer
    /// `question`, `type` e `difficulty` válidos, ou se o tipo/dificuldade
    /// declarados não forem os pedidos.
    pub async fn generate_question(
        &self,
        concept: &Concept,
        mastery: MasteryLevel,
        difficulty: DifficultyLevel,
    ) -> Result<Question, GenerationError> {
        let question_type = question_type_for(mastery, difficulty);
        let prompt = prompts::question_prompt(concept, mastery, difficulty, question_type);
        let text = self
            .backend
            .complete(prompts::QUESTION_SYSTEM, &prompt)
            .await
            .inspect_err(|e| tracing::warn!(concept_id = %concept.id, error = %e, "Falha ao gerar pergunta"))?;
        let question = self.parser.question(&text)?;
        if question.question_type != question_type || question.difficulty != difficulty {
            tracing::warn!(
                concept_id = %concept.id,
                expected = %question_type,
                got = %question.question_type,
                "Pergunta fora do tipo/dificuldade pedidos"
            );
            return Err(GenerationError::Malformed(format!(
                "pergunta {}/{} quando foi pedida {}/{}",
                question.question_type, question.difficulty, question_type, difficulty
            )));
        }
        tracing::debug!(concept_id = %concept.id, kind = %question.question_type, "Pergunta gerada");
        Ok(question)
    }

    /// Avalia a resposta do estudante contra o conteúdo do conceito.
    pub async fn evaluate_answer(
        &self,
        concept: &Concept,
        question: &Question,
        user_answer: &str,
    ) -> Result<Evaluation, GenerationError> {
        let prompt = prompts::evaluation_prompt(concept, question, user_answer);
        let text = self
            .backend
            .complete(prompts::EVALUATION_SYSTEM, &prompt)
            .await
            .inspect_err(|e| tracing::warn!(concept_id = %concept.id, error = %e, "Falha ao avaliar resposta"))?;
        self.parser.evaluation(&text)
    }

    /// Extrai conceitos-chave de um material de estudo.
    pub async fn extract_concepts(&self, material: &str) -> Result<Vec<ConceptDraft>, GenerationError> {
        let prompt = prompts::extraction_prompt(material);
        let text = self
            .backend
            .complete(prompts::EXTRACTION_SYSTEM, &prompt)
            .await?;
        self.parser.drafts(&text)
    }
}


#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::testing::ScriptedBackend;
    use super::*;

    #[test]
    fn question_type_follows_mastery() {
        use DifficultyLevel::*;
        use MasteryLevel::*;
        assert_eq!(question_type_for(Unknown, Expert), QuestionType::Recall);
        assert_eq!(question_type_for(Learning, Basic), QuestionType::Recall);
        assert_eq!(question_type_for(Familiar, Intermediate), QuestionType::Recall);
        assert_eq!(question_type_for(Familiar, Advanced), QuestionType::Application);
        assert_eq!(question_type_for(Proficient, Basic), QuestionType::Application);
        assert_eq!(question_type_for(Proficient, Expert), QuestionType::Synthesis);
        assert_eq!(question_type_for(Mastered, Basic), QuestionType::Synthesis);
    }

    #[tokio::test]
    async fn generate_question_parses_reply() {
        let backend = ScriptedBackend::new();
        backend.reply_question("Define osmosis.");
        let gateway = QuestionGateway::new(backend.clone());
        let concept = Concept::new("bio", "Osmose", "Difusão de água", DifficultyLevel::Basic, Utc::now());

        let q = gateway
            .generate_question(&concept, MasteryLevel::Unknown, DifficultyLevel::Basic)
            .await
            .unwrap();
        assert_eq!(q.text, "Define osmosis.");
        assert!(backend.prompts()[0].contains("Write one recall question"));
    }

    #[tokio::test]
    async fn question_of_another_type_is_rejected() {
        let backend = ScriptedBackend::new();
        backend
            .reply(r#"{"question": "Compare X and Y", "type": "synthesis", "difficulty": "EXPERT"}"#)
            .reply_question_as("Define osmosis.", QuestionType::Recall, DifficultyLevel::Expert);
        let gateway = QuestionGateway::new(backend.clone());
        let concept = Concept::new("bio", "Osmose", "Difusão de água", DifficultyLevel::Basic, Utc::now());

        let err = gateway
            .generate_question(&concept, MasteryLevel::Unknown, DifficultyLevel::Basic)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));

        let err = gateway
            .generate_question(&concept, MasteryLevel::Unknown, DifficultyLevel::Basic)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn question_type_matches_requested_mastery() {
        let backend = ScriptedBackend::new();
        backend.reply_question_as("Apply it.", QuestionType::Application, DifficultyLevel::Basic);
        let gateway = QuestionGateway::new(backend.clone());
        let concept = Concept::new("bio", "Osmose", "Difusão de água", DifficultyLevel::Basic, Utc::now());

        let q = gateway
            .generate_question(&concept, MasteryLevel::Proficient, DifficultyLevel::Basic)
            .await
            .unwrap();
        assert_eq!(q.question_type, QuestionType::Application);
        assert!(backend.prompts()[0].contains("application"));
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_generation_error() {
        let backend = ScriptedBackend::new();
        backend.fail();
        let gateway = QuestionGateway::new(backend);
        let concept = Concept::new("bio", "Osmose", "Difusão de água", DifficultyLevel::Basic, Utc::now());
        let question = Question {
            text: "Define osmosis.".into(),
            question_type: QuestionType::Recall,
            difficulty: DifficultyLevel::Basic,
        };

        let err = gateway
            .evaluate_answer(&concept, &question, "water moves")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::HttpStatus { .. }));
    }

    #[tokio::test]
    async fn extract_concepts_returns_drafts() {
        let backend = ScriptedBackend::new();
        backend.reply(r#"[{"name": "Osmosis", "content": "Water diffusion", "difficulty": 2}]"#);
        let gateway = QuestionGateway::new(backend);

        let drafts = gateway.extract_concepts("notes about cells").await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].difficulty, DifficultyLevel::Intermediate);
    }
}
