//! # Scheduler — Repetição Espaçada
//!
//! Função de transição **pura e determinística**: dado o nível atual, os
//! contadores de sequência e o resultado de uma resposta, calcula o novo
//! nível, os novos contadores e o intervalo até a próxima revisão.
//!
//! ## Regras
//!
//! ```text
//! Resposta incorreta:
//!   nível ← nível.demote()        (no máximo um degrau, piso UNKNOWN)
//!   sequências ← 0
//!   intervalo ← 1 dia
//!
//! Resposta correta:
//!   correct ← correct + 1
//!   unaided ← hints == 0 ? unaided + 1 : 0
//!   se unaided >= 3:
//!       nível ← nível.promote()   (no máximo um degrau, teto MASTERED)
//!       sequências ← 0
//!   intervalo ← intervalo-base do nível RESULTANTE
//! ```
//!
//! Um acerto com dicas conta para `correct_streak`, mas zera o subcontador
//! `unaided`, pois a promoção exige três acertos seguidos **sem ajuda**.
//!
//! ## Ordem de Revisão
//!
//! [`due_order`] ordena os conceitos devidos: menor domínio primeiro,
//! depois o `next_review` mais antigo.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Concept, MasteryLevel};

/// Acertos consecutivos sem dica necessários para subir um degrau.
pub const PROMOTION_STREAK: u32 = 3;

/// Contadores de sequência carregados junto ao conceito.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    /// Acertos consecutivos (com ou sem dica).
    pub correct: u32,
    /// Acertos consecutivos sem dica.
    pub unaided: u32,
}

/// Resultado de [`next_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub mastery: MasteryLevel,
    pub streak: StreakState,
    pub interval: Duration,
    /// Houve promoção de nível nesta resposta.
    pub promoted: bool,
    /// Houve rebaixamento de nível nesta resposta.
    pub demoted: bool,
}

impl Transition {
    /// Próxima revisão a partir do momento da submissão.
    pub fn next_review(&self, submitted_at: DateTime<Utc>) -> DateTime<Utc> {
        submitted_at + self.interval
    }
}

/// Calcula a transição de estado para uma resposta avaliada.
pub fn next_state(
    current: MasteryLevel,
    streak: StreakState,
    correct: bool,
    hints_used: u32,
) -> Transition {
    if !correct {
        let mastery = current.demote();
        return Transition {
            mastery,
            streak: StreakState::default(),
            interval: Duration::days(1),
            promoted: false,
            demoted: mastery != current,
        };
    }

    let mut next = StreakState {
        correct: streak.correct + 1,
        unaided: if hints_used == 0 { streak.unaided + 1 } else { 0 },
    };

    let mut mastery = current;
    if next.correct >= PROMOTION_STREAK && next.unaided >= PROMOTION_STREAK {
        mastery = current.promote();
        next = StreakState::default();
    }

    Transition {
        mastery,
        streak: next,
        interval: mastery.review_interval(),
        promoted: mastery != current,
        demoted: false,
    }
}

/// Ordem de apresentação dos conceitos devidos.
///
/// Chave primária: `mastery_level` ascendente. Secundária: `next_review`
/// ascendente. O `id` só desempata para manter a ordem estável.
pub fn due_order(a: &Concept, b: &Concept) -> Ordering {
    a.mastery_level()
        .cmp(&b.mastery_level())
        .then_with(|| a.next_review().cmp(&b.next_review()))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DifficultyLevel;

    fn streak(correct: u32, unaided: u32) -> StreakState {
        StreakState { correct, unaided }
    }

    #[test]
    fn incorrect_answer_demotes_one_level_and_resets_streak() {
        for level in MasteryLevel::ALL {
            let t = next_state(level, streak(2, 2), false, 0);
            assert_eq!(t.mastery, level.demote());
            assert_eq!(t.streak, StreakState::default());
            assert_eq!(t.interval, Duration::days(1));
        }
    }

    #[test]
    fn incorrect_answer_at_unknown_stays_unknown() {
        let t = next_state(MasteryLevel::Unknown, streak(0, 0), false, 0);
        assert_eq!(t.mastery, MasteryLevel::Unknown);
        assert!(!t.demoted);
    }

    #[test]
    fn three_unaided_correct_answers_promote_once() {
        let mut level = MasteryLevel::Learning;
        let mut s = StreakState::default();
        let mut promotions = 0;
        for _ in 0..4 {
            let t = next_state(level, s, true, 0);
            if t.promoted {
                promotions += 1;
            }
            level = t.mastery;
            s = t.streak;
        }
        assert_eq!(level, MasteryLevel::Familiar);
        assert_eq!(promotions, 1);
        assert_eq!(s, streak(1, 1));
    }

    #[test]
    fn learning_with_streak_two_promotes_to_familiar() {
        let now = Utc::now();
        let t = next_state(MasteryLevel::Learning, streak(2, 2), true, 0);
        assert_eq!(t.mastery, MasteryLevel::Familiar);
        assert_eq!(t.streak, StreakState::default());
        assert_eq!(t.next_review(now) - now, Duration::days(4));
    }

    #[test]
    fn proficient_incorrect_falls_to_familiar_for_one_day() {
        let now = Utc::now();
        let t = next_state(MasteryLevel::Proficient, streak(1, 1), false, 0);
        assert_eq!(t.mastery, MasteryLevel::Familiar);
        assert_eq!(t.streak.correct, 0);
        assert_eq!(t.next_review(now) - now, Duration::days(1));
    }

    #[test]
    fn correct_without_promotion_uses_current_level_interval() {
        let t = next_state(MasteryLevel::Proficient, streak(0, 0), true, 0);
        assert_eq!(t.mastery, MasteryLevel::Proficient);
        assert_eq!(t.interval, Duration::days(7));
    }

    #[test]
    fn hinted_correct_answer_keeps_streak_but_blocks_promotion() {
        let t = next_state(MasteryLevel::Learning, streak(2, 2), true, 1);
        assert_eq!(t.mastery, MasteryLevel::Learning);
        assert_eq!(t.streak, streak(3, 0));

        // depois da dica, são necessários mais três acertos sem ajuda
        let mut s = t.streak;
        let mut level = t.mastery;
        for _ in 0..2 {
            let t = next_state(level, s, true, 0);
            assert!(!t.promoted);
            level = t.mastery;
            s = t.streak;
        }
        let t = next_state(level, s, true, 0);
        assert!(t.promoted);
        assert_eq!(t.mastery, MasteryLevel::Familiar);
    }

    #[test]
    fn mastered_is_a_ceiling() {
        let t = next_state(MasteryLevel::Mastered, streak(2, 2), true, 0);
        assert_eq!(t.mastery, MasteryLevel::Mastered);
        assert!(!t.promoted);
        assert_eq!(t.streak, StreakState::default());
        assert_eq!(t.interval, Duration::days(14));
    }

    #[test]
    fn due_order_puts_lowest_mastery_first() {
        let now = Utc::now();
        let unknown = Concept::new("c", "A", "a", DifficultyLevel::Basic, now);
        let familiar = Concept::new("c", "B", "b", DifficultyLevel::Basic, now)
            .with_progress(MasteryLevel::Familiar, StreakState::default(), now - Duration::days(1));

        let mut due = vec![familiar.clone(), unknown.clone()];
        due.sort_by(due_order);
        assert_eq!(due[0].id, unknown.id);

        let older = Concept::new("c", "C", "c", DifficultyLevel::Basic, now - Duration::hours(3));
        let mut due = vec![unknown.clone(), older.clone()];
        due.sort_by(due_order);
        assert_eq!(due[0].id, older.id);
    }
}
