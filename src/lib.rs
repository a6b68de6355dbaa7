//! # Active Recall — Motor de Recordação Ativa
//!
//! Agenda revisões de conceitos por repetição espaçada, pede perguntas e
//! avaliações a um colaborador de IA externo e acompanha o domínio do
//! estudante em cinco degraus (UNKNOWN → MASTERED).
//!
//! ## Arquitetura
//!
//! ```text
//! web (axum) ──▶ Orchestrator ──┬──▶ QuestionGateway ──▶ CompletionBackend (LLM)
//!                    │          ├──▶ scheduler (função pura)
//!                    │          └──▶ ConceptStore ──▶ persistence (JSON)
//!                    └──▶ progress (somente leitura)
//! ```
//!
//! | Módulo | Papel |
//! |--------|-------|
//! | [`core`] | Tipos de domínio e o `ConceptStore` |
//! | [`scheduler`] | Transição de domínio e intervalo de revisão |
//! | [`gateway`] | Perguntas, avaliações e extração via colaborador |
//! | [`orchestrator`] | Máquina de estados da sessão de estudo |
//! | [`progress`] | Agregação de progresso por turma |
//! | [`persistence`] | Snapshot JSON das tabelas |
//! | [`config`] | Configuração por variáveis de ambiente |
//! | [`error`] | Taxonomia de erros |
//! | [`web`] | API HTTP, tabela de sessões e SSE |

pub mod config;
pub mod core;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod persistence;
pub mod progress;
pub mod scheduler;
pub mod web;
