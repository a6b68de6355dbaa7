//! # Níveis de Domínio e Dificuldade
//!
//! Dois eixos independentes descrevem cada [`Concept`](super::Concept):
//!
//! - [`MasteryLevel`] — **quanto** o estudante já retém do conceito
//! - [`DifficultyLevel`] — **quão exigente** é o material em si
//!
//! ## Escada de Domínio
//!
//! ```text
//! UNKNOWN(0) → LEARNING(1) → FAMILIAR(2) → PROFICIENT(3) → MASTERED(4)
//!    1 dia       2 dias        4 dias         7 dias         14 dias
//! ```
//!
//! Subir ou descer é sempre **um degrau por vez**. As operações
//! [`promote()`](MasteryLevel::promote) e [`demote()`](MasteryLevel::demote)
//! são totais: no topo e na base elas simplesmente devolvem o próprio nível.
//!
//! ## Representação Persistida
//!
//! Os dois enums são serializados como inteiros (`mastery_level: 0..4`,
//! `difficulty_level: 0..3`), que é o formato das tabelas `concepts`.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inteiro fora da faixa de um dos enums de nível.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("nível inválido: {0}")]
pub struct InvalidLevel(pub u8);

/// Estágio de retenção de um conceito.
///
/// A ordem de declaração é a ordem do domínio: `Unknown < Learning < ... < Mastered`.
/// É essa ordem (via `Ord`) que a seleção de conceitos devidos usa como
/// chave primária.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MasteryLevel {
    /// Nunca respondido corretamente.
    Unknown,
    /// Primeiros acertos.
    Learning,
    /// Reconhece o conceito com alguma segurança.
    Familiar,
    /// Aplica o conceito.
    Proficient,
    /// Retenção de longo prazo.
    Mastered,
}

impl MasteryLevel {
    /// Todos os níveis, do mais baixo ao mais alto.
    pub const ALL: [MasteryLevel; 5] = [
        MasteryLevel::Unknown,
        MasteryLevel::Learning,
        MasteryLevel::Familiar,
        MasteryLevel::Proficient,
        MasteryLevel::Mastered,
    ];

    /// Posição na escada (0 = UNKNOWN, 4 = MASTERED).
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Sobe um degrau. `Mastered` é o teto.
    pub fn promote(self) -> Self {
        Self::ALL
            .get(self.index() as usize + 1)
            .copied()
            .unwrap_or(MasteryLevel::Mastered)
    }

    /// Desce um degrau. `Unknown` é o piso.
    pub fn demote(self) -> Self {
        match self.index() {
            0 => MasteryLevel::Unknown,
            i => Self::ALL[i as usize - 1],
        }
    }

    /// Intervalo-base de revisão associado ao nível.
    pub fn review_interval(self) -> Duration {
        match self {
            MasteryLevel::Unknown => Duration::days(1),
            MasteryLevel::Learning => Duration::days(2),
            MasteryLevel::Familiar => Duration::days(4),
            MasteryLevel::Proficient => Duration::days(7),
            MasteryLevel::Mastered => Duration::days(14),
        }
    }

    /// Valor normalizado em `[0.0, 1.0]`, em passos lineares de 0.25.
    pub fn score(self) -> f64 {
        f64::from(self.index()) * 0.25
    }

    /// Nome canônico em maiúsculas (ex: `"FAMILIAR"`).
    pub fn name(self) -> &'static str {
        match self {
            MasteryLevel::Unknown => "UNKNOWN",
            MasteryLevel::Learning => "LEARNING",
            MasteryLevel::Familiar => "FAMILIAR",
            MasteryLevel::Proficient => "PROFICIENT",
            MasteryLevel::Mastered => "MASTERED",
        }
    }
}

impl fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<MasteryLevel> for u8 {
    fn from(level: MasteryLevel) -> Self {
        level.index()
    }
}

impl TryFrom<u8> for MasteryLevel {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidLevel(value))
    }
}

/// Dificuldade intrínseca do material: eixo independente do domínio.
///
/// Usada para escolher o estilo da pergunta (veja
/// [`question_type_for`](crate::gateway::question_type_for)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DifficultyLevel {
    Basic,
    Intermediate,
    Advanced,
    Expert,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 4] = [
        DifficultyLevel::Basic,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
        DifficultyLevel::Expert,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DifficultyLevel::Basic => "BASIC",
            DifficultyLevel::Intermediate => "INTERMEDIATE",
            DifficultyLevel::Advanced => "ADVANCED",
            DifficultyLevel::Expert => "EXPERT",
        }
    }

    /// Interpreta o nome vindo do colaborador de IA (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        Self::ALL.into_iter().find(|d| d.name() == upper)
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for DifficultyLevel {
    type Error = InvalidLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(InvalidLevel(value))
    }
}
