//! # Prompts e Parsers do Colaborador de IA
//!
//! Este módulo define o **contrato textual** com o serviço de completion:
//! como cada pedido é redigido e como cada resposta é validada.
//!
//! ## Formato das Respostas
//!
//! Todas as respostas esperadas são JSON. O modelo às vezes envolve o JSON
//! em texto ou em um bloco ```` ```json ````, então o parser primeiro
//! isola o trecho JSON e só depois desserializa.
//!
//! | Pedido | Resposta esperada |
//! |--------|-------------------|
//! | Pergunta | `{"question": str, "type": str, "difficulty": str}` |
//! | Avaliação | `{"correct": bool, "score": 0..100, "feedback": str, "hints_used": int?}` |
//! | Extração | `[{"name": str, "content": str, "difficulty": str\|int}]` |
//!
//! Campo obrigatório ausente ou fora da faixa ⇒ [`GenerationError::Malformed`].

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{Evaluation, GenerationError, Question, QuestionType};
use crate::core::{Concept, ConceptDraft, DifficultyLevel, MasteryLevel};

/// Máximo de caracteres do material enviados para extração.
const MATERIAL_EXCERPT_CHARS: usize = 8000;

/// Máximo de caracteres do conteúdo do conceito enviados por pedido.
const CONTENT_EXCERPT_CHARS: usize = 4000;

pub const QUESTION_SYSTEM: &str = "You are an educational assistant that writes active-recall study questions. \
Answer with a single JSON object and nothing else.";

pub const EVALUATION_SYSTEM: &str = "You are an educational assistant that grades student answers for active-recall sessions. \
Be encouraging but honest. Answer with a single JSON object and nothing else.";

pub const EXTRACTION_SYSTEM: &str = "You are an educational assistant that extracts key study concepts from lecture notes. \
Answer with a single JSON array and nothing else.";

/// Corta `text` em no máximo `max` caracteres, respeitando UTF-8.
fn excerpt(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pedido de geração de pergunta.
pub fn question_prompt(
    concept: &Concept,
    mastery: MasteryLevel,
    difficulty: DifficultyLevel,
    question_type: QuestionType,
) -> String {
    format!(
        r#"Write one {kind} question about the concept below.

Question types:
- recall: basic understanding and memory of facts (What is...? Define...)
- application: apply the concept to a new situation (How would you use...?)
- synthesis: combine ideas and analyse implications (Compare... Analyse...)

Student mastery: {mastery}
Target difficulty: {difficulty}

Concept: {name}
Study material:
{content}

Return exactly:
{{"question": "<question text>", "type": "{kind}", "difficulty": "{difficulty}"}}"#,
        kind = question_type.name(),
        mastery = mastery.name(),
        difficulty = difficulty.name(),
        name = concept.name,
        content = excerpt(&concept.content, CONTENT_EXCERPT_CHARS),
    )
}

/// Pedido de avaliação de uma resposta livre.
pub fn evaluation_prompt(concept: &Concept, question: &Question, answer: &str) -> String {
    format!(
        r#"Grade the student's answer against the study material.

Question: {question}

Study material:
{content}

Student answer:
{answer}

Return exactly:
{{"correct": true or false, "score": 0-100, "feedback": "<what was right and what to improve>", "hints_used": 0}}"#,
        question = question.text,
        content = excerpt(&concept.content, CONTENT_EXCERPT_CHARS),
        answer = answer,
    )
}

/// Pedido de extração de conceitos a partir de material de estudo.
pub fn extraction_prompt(material: &str) -> String {
    format!(
        r#"Based on the following lecture content, list 5-8 key concepts for active recall study.
Each concept must be a fundamental idea, definition or principle a student should master.

Return exactly a JSON array:
[{{"name": "Concept name", "content": "Detailed explanation", "difficulty": "BASIC"}}]

Difficulty is one of BASIC, INTERMEDIATE, ADVANCED, EXPERT.

Content:
{content}"#,
        content = excerpt(material, MATERIAL_EXCERPT_CHARS),
    )
}

#[derive(Deserialize)]
struct RawQuestion {
    question: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    difficulty: Option<String>,
}

#[derive(Deserialize)]
struct RawEvaluation {
    correct: Option<bool>,
    score: Option<i64>,
    feedback: Option<String>,
    hints_used: Option<i64>,
}

#[derive(Deserialize)]
struct RawDraft {
    name: Option<String>,
    content: Option<String>,
    difficulty: Option<Value>,
}

/// Valida e converte respostas do colaborador.
///
/// Mantém as regexes compiladas uma única vez.
pub struct ResponseParser {
    /// Conteúdo de um bloco ```` ```json ... ``` ````.
    fenced_re: Regex,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            fenced_re: Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap(),
        }
    }

    /// Isola o trecho JSON delimitado por `open`/`close`.
    fn json_slice<'a>(&self, text: &'a str, open: char, close: char) -> Option<&'a str> {
        let body = self
            .fenced_re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(text);
        let start = body.find(open)?;
        let end = body.rfind(close)?;
        (start < end).then(|| &body[start..=end])
    }

    fn object<T: for<'de> Deserialize<'de>>(&self, text: &str) -> Result<T, GenerationError> {
        let slice = self
            .json_slice(text, '{', '}')
            .ok_or_else(|| GenerationError::Malformed("nenhum objeto JSON na resposta".into()))?;
        serde_json::from_str(slice).map_err(|e| GenerationError::Malformed(e.to_string()))
    }

    pub fn question(&self, text: &str) -> Result<Question, GenerationError> {
        let raw: RawQuestion = self.object(text)?;
        let body = raw
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| GenerationError::Malformed("campo 'question' ausente".into()))?;
        let kind = raw
            .kind
            .ok_or_else(|| GenerationError::Malformed("campo 'type' ausente".into()))?;
        let question_type = QuestionType::parse(&kind)
            .ok_or_else(|| GenerationError::Malformed(format!("tipo de pergunta desconhecido: {kind}")))?;
        let difficulty = raw
            .difficulty
            .ok_or_else(|| GenerationError::Malformed("campo 'difficulty' ausente".into()))?;
        let difficulty = DifficultyLevel::parse(&difficulty)
            .ok_or_else(|| GenerationError::Malformed(format!("dificuldade desconhecida: {difficulty}")))?;

        Ok(Question {
            text: body,
            question_type,
            difficulty,
        })
    }

    pub fn evaluation(&self, text: &str) -> Result<Evaluation, GenerationError> {
        let raw: RawEvaluation = self.object(text)?;
        let correct = raw
            .correct
            .ok_or_else(|| GenerationError::Malformed("campo 'correct' ausente".into()))?;
        let score = raw
            .score
            .ok_or_else(|| GenerationError::Malformed("campo 'score' ausente".into()))?;
        let score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or_else(|| GenerationError::Malformed(format!("score fora de 0..100: {score}")))?;
        let feedback = raw
            .feedback
            .ok_or_else(|| GenerationError::Malformed("campo 'feedback' ausente".into()))?;
        let hints_used = match raw.hints_used {
            None => 0,
            Some(h) => u32::try_from(h)
                .map_err(|_| GenerationError::Malformed(format!("hints_used negativo: {h}")))?,
        };

        Ok(Evaluation {
            correct,
            score,
            feedback,
            hints_used,
        })
    }

    /// Converte a lista de conceitos extraídos.
    ///
    /// Entradas sem nome ou conteúdo são descartadas; a dificuldade aceita
    /// nome (`"ADVANCED"`) ou número 1..4, e cai para `BASIC` se ausente.
    pub fn drafts(&self, text: &str) -> Result<Vec<ConceptDraft>, GenerationError> {
        let slice = self
            .json_slice(text, '[', ']')
            .ok_or_else(|| GenerationError::Malformed("nenhum array JSON na resposta".into()))?;
        let raw: Vec<RawDraft> =
            serde_json::from_str(slice).map_err(|e| GenerationError::Malformed(e.to_string()))?;

        let drafts = raw
            .into_iter()
            .filter_map(|d| {
                let name = d.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
                let content = d.content.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())?;
                let difficulty = match d.difficulty {
                    Some(Value::String(s)) => DifficultyLevel::parse(&s),
                    Some(Value::Number(n)) => n
                        .as_u64()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| DifficultyLevel::ALL.get(i as usize).copied()),
                    _ => None,
                }
                .unwrap_or(DifficultyLevel::Basic);
                Some(ConceptDraft {
                    name,
                    content,
                    difficulty,
                })
            })
            .collect();
        Ok(drafts)
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn parser() -> ResponseParser {
        ResponseParser::new()
    }

    #[test]
    fn question_inside_code_fence() {
        let text = "Here you go:\n```json\n{\"question\": \"What is osmosis?\", \"type\": \"recall\", \"difficulty\": \"basic\"}\n```";
        let q = parser().question(text).unwrap();
        assert_eq!(q.text, "What is osmosis?");
        assert_eq!(q.question_type, QuestionType::Recall);
        assert_eq!(q.difficulty, DifficultyLevel::Basic);
    }

    #[test]
    fn question_missing_type_is_malformed() {
        let err = parser()
            .question(r#"{"question": "Why?", "difficulty": "BASIC"}"#)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn plain_text_is_malformed() {
        assert!(matches!(
            parser().question("What is osmosis?"),
            Err(GenerationError::Malformed(_))
        ));
        assert!(matches!(
            parser().evaluation("correct!"),
            Err(GenerationError::Malformed(_))
        ));
    }

    #[test]
    fn evaluation_defaults_hints_to_zero() {
        let e = parser()
            .evaluation(r#"{"correct": true, "score": 85, "feedback": "Good"}"#)
            .unwrap();
        assert!(e.correct);
        assert_eq!(e.score, 85);
        assert_eq!(e.hints_used, 0);
    }

    #[test]
    fn evaluation_rejects_out_of_range_score() {
        for text in [
            r#"{"correct": true, "score": 101, "feedback": "x"}"#,
            r#"{"correct": true, "score": -1, "feedback": "x"}"#,
            r#"{"correct": true, "feedback": "x"}"#,
        ] {
            assert!(matches!(parser().evaluation(text), Err(GenerationError::Malformed(_))), "{text}");
        }
    }

    #[test]
    fn evaluation_without_correct_is_malformed() {
        let err = parser()
            .evaluation(r#"{"score": 40, "feedback": "partial"}"#)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn drafts_accept_names_and_numbers() {
        let text = r#"Sure! [
            {"name": "Osmosis", "content": "Water diffusion", "difficulty": "INTERMEDIATE"},
            {"name": "Mitosis", "content": "Cell division", "difficulty": 3},
            {"name": "", "content": "ignored"},
            {"name": "Diffusion", "content": "Particles spread"}
        ]"#;
        let drafts = parser().drafts(text).unwrap();
        let got: Vec<_> = drafts.iter().map(|d| (d.name.as_str(), d.difficulty)).collect();
        assert_eq!(
            got,
            vec![
                ("Osmosis", DifficultyLevel::Intermediate),
                ("Mitosis", DifficultyLevel::Advanced),
                ("Diffusion", DifficultyLevel::Basic),
            ]
        );
    }

    #[test]
    fn prompts_carry_concept_and_target() {
        let concept = Concept::new("bio", "Osmose", "Difusão de água", DifficultyLevel::Advanced, Utc::now());
        let prompt = question_prompt(
            &concept,
            MasteryLevel::Proficient,
            DifficultyLevel::Advanced,
            QuestionType::Synthesis,
        );
        assert!(prompt.contains("Osmose"));
        assert!(prompt.contains("Difusão de água"));
        assert!(prompt.contains("PROFICIENT"));
        assert!(prompt.contains("\"type\": \"synthesis\""));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("ação", 2), "aç");
        assert_eq!(excerpt("abc", 10), "abc");
    }
}
