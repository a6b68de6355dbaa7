//! # Agregador de Progresso
//!
//! Leitura pura sobre o [`ConceptStore`]: contagens por nível, média de
//! domínio normalizada e quantos conceitos estão devidos.
//!
//! Não há cache. Cada chamada lê o store naquele instante, então uma
//! revisão gravada pelo orquestrador aparece na próxima leitura.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{ConceptStore, MasteryLevel};

/// Quantidade de conceitos em cada nível de domínio.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MasteryDistribution {
    pub unknown: usize,
    pub learning: usize,
    pub familiar: usize,
    pub proficient: usize,
    pub mastered: usize,
}

impl MasteryDistribution {
    fn slot(&mut self, level: MasteryLevel) -> &mut usize {
        match level {
            MasteryLevel::Unknown => &mut self.unknown,
            MasteryLevel::Learning => &mut self.learning,
            MasteryLevel::Familiar => &mut self.familiar,
            MasteryLevel::Proficient => &mut self.proficient,
            MasteryLevel::Mastered => &mut self.mastered,
        }
    }

    pub fn count(&self, level: MasteryLevel) -> usize {
        match level {
            MasteryLevel::Unknown => self.unknown,
            MasteryLevel::Learning => self.learning,
            MasteryLevel::Familiar => self.familiar,
            MasteryLevel::Proficient => self.proficient,
            MasteryLevel::Mastered => self.mastered,
        }
    }
}

/// Resumo de progresso de uma turma.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total_concepts: usize,
    pub concepts_due: usize,
    /// Média em `[0.0, 1.0]` (UNKNOWN = 0.0, MASTERED = 1.0). `0.0` se vazio.
    pub average_mastery: f64,
    pub mastery_distribution: MasteryDistribution,
}

/// Calcula o progresso da turma em `now`.
pub fn get_progress(store: &ConceptStore, class_id: &str, now: DateTime<Utc>) -> Progress {
    let concepts = store.concepts_in_class(class_id);

    let mut distribution = MasteryDistribution::default();
    let mut concepts_due = 0;
    let mut mastery_sum = 0.0;
    for concept in &concepts {
        *distribution.slot(concept.mastery_level()) += 1;
        mastery_sum += concept.mastery_level().score();
        if concept.is_due(now) {
            concepts_due += 1;
        }
    }

    let average_mastery = if concepts.is_empty() {
        0.0
    } else {
        mastery_sum / concepts.len() as f64
    };

    Progress {
        total_concepts: concepts.len(),
        concepts_due,
        average_mastery,
        mastery_distribution: distribution,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::core::{Concept, DifficultyLevel};
    use crate::scheduler::StreakState;

    fn seeded_store(now: DateTime<Utc>) -> ConceptStore {
        let store = ConceptStore::in_memory();
        let concepts = vec![
            Concept::new("bio", "A", "a", DifficultyLevel::Basic, now),
            Concept::new("bio", "B", "b", DifficultyLevel::Basic, now).with_progress(
                MasteryLevel::Familiar,
                StreakState::default(),
                now + Duration::days(2),
            ),
            Concept::new("bio", "C", "c", DifficultyLevel::Basic, now).with_progress(
                MasteryLevel::Mastered,
                StreakState::default(),
                now - Duration::days(1),
            ),
            Concept::new("quim", "D", "d", DifficultyLevel::Basic, now),
        ];
        store.insert_concepts(concepts).unwrap();
        store
    }

    #[test]
    fn aggregates_only_the_requested_class() {
        let now = Utc::now();
        let store = seeded_store(now);
        let p = get_progress(&store, "bio", now);

        assert_eq!(p.total_concepts, 3);
        assert_eq!(p.concepts_due, 2);
        assert!((p.average_mastery - 0.5).abs() < 1e-9);
        assert_eq!(p.mastery_distribution.count(MasteryLevel::Unknown), 1);
        assert_eq!(p.mastery_distribution.count(MasteryLevel::Familiar), 1);
        assert_eq!(p.mastery_distribution.count(MasteryLevel::Mastered), 1);
        assert_eq!(p.mastery_distribution.count(MasteryLevel::Learning), 0);
    }

    #[test]
    fn empty_class_has_zero_average() {
        let store = ConceptStore::in_memory();
        let p = get_progress(&store, "vazia", Utc::now());
        assert_eq!(p.total_concepts, 0);
        assert_eq!(p.average_mastery, 0.0);
        assert_eq!(p.mastery_distribution, MasteryDistribution::default());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let now = Utc::now();
        let store = seeded_store(now);
        assert_eq!(get_progress(&store, "bio", now), get_progress(&store, "bio", now));
    }

    #[test]
    fn distribution_serializes_with_level_names() {
        let json = serde_json::to_value(MasteryDistribution::default()).unwrap();
        assert!(json.get("UNKNOWN").is_some());
        assert!(json.get("MASTERED").is_some());
    }
}
