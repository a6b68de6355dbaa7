//! # Persistência — Snapshot JSON do Concept Store
//!
//! Serializa as duas tabelas do motor em um único arquivo JSON
//! (por padrão `data/recall.json`, veja [`AppConfig`](crate::config::AppConfig)).
//!
//! ## Formato de Armazenamento
//!
//! ```json
//! {
//!   "concepts":        [ { "id": "...", "mastery_level": 2, ... } ],
//!   "review_sessions": [ { "id": "...", "concept_id": "...", ... } ]
//! }
//! ```
//!
//! Os nomes de campo são os das tabelas `concepts` e `review_sessions`.
//!
//! ## Atomicidade
//!
//! A escrita vai para `<arquivo>.tmp` e depois é renomeada sobre o destino,
//! então um crash no meio da escrita nunca deixa um snapshot truncado.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Concept, ReviewRecord};
use crate::error::StorageError;

/// Conteúdo completo do arquivo de snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub review_sessions: Vec<ReviewRecord>,
}

/// Grava o snapshot em disco (pretty-printed, escrita atômica).
///
/// Cria o diretório pai se não existir.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Carrega o snapshot, ou devolve um vazio se o arquivo não existir.
///
/// # Erros
///
/// Retorna erro se o arquivo existir mas não puder ser lido ou
/// desserializado.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "Nenhum snapshot encontrado, iniciando store vazio");
        return Ok(Snapshot::default());
    }
    let json = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&json)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::core::DifficultyLevel;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load_snapshot(&dir.path().join("nada.json")).unwrap();
        assert!(snapshot.concepts.is_empty());
        assert!(snapshot.review_sessions.is_empty());
    }

    #[test]
    fn saved_snapshot_uses_table_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("recall.json");
        let concept = Concept::new("bio", "Osmose", "Difusão de água", DifficultyLevel::Advanced, Utc::now());
        let snapshot = Snapshot {
            concepts: vec![concept.clone()],
            review_sessions: Vec::new(),
        };
        save_snapshot(&path, &snapshot).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let row = &raw["concepts"][0];
        assert_eq!(row["mastery_level"], 0);
        assert_eq!(row["difficulty_level"], 2);
        assert_eq!(row["review_count"], 0);
        assert!(row["last_reviewed"].is_null());

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.concepts, vec![concept]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recall.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(matches!(load_snapshot(&path), Err(StorageError::Json(_))));
    }
}
