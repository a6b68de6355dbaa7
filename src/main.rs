//! # Active Recall — Servidor HTTP
//!
//! **Ponto de entrada** do motor de recordação ativa.
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Configura tracing/logging
//!   ├── Lê AppConfig do ambiente
//!   ├── Carrega o ConceptStore do disco (arquivo ilegível aborta)
//!   ├── Cria o cliente do colaborador de IA
//!   ├── Cria broadcast channel para SSE
//!   ├── Monta Orchestrator, AppState e Router
//!   └── Inicia servidor TCP
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Executar com logs padrão (info)
//! LLM_API_KEY=sk-... cargo run
//!
//! # Executar com logs detalhados e outro endpoint
//! RUST_LOG=debug LLM_BASE_URL=http://localhost:11434 LLM_MODEL=llama3 cargo run
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use active_recall::config::AppConfig;
use active_recall::core::ConceptStore;
use active_recall::gateway::llm::LlmClient;
use active_recall::gateway::QuestionGateway;
use active_recall::orchestrator::Orchestrator;
use active_recall::web::events::StudyEvent;
use active_recall::web::state::{AppState, SessionTable};
use active_recall::web::create_router;

#[tokio::main]
async fn main() -> Result<()> {
    // Aceita RUST_LOG para configurar o nível. Exemplo: RUST_LOG=debug cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("📚 Active Recall — Starting...");

    let config = AppConfig::from_env();

    // Arquivo ausente ⇒ store vazio. Arquivo ilegível ⇒ não sobe: servir
    // sem persistência perderia toda revisão no próximo restart.
    let store = ConceptStore::open(config.data_path.clone())
        .with_context(|| format!("falha ao carregar o store de {}", config.data_path.display()))?;
    tracing::info!(
        path = %config.data_path.display(),
        concepts = store.concept_count(),
        reviews = store.review_count(),
        "Store carregado do disco"
    );
    let store = Arc::new(store);

    let client = LlmClient::new(config.llm.clone())?;
    let generator_ready = client.is_available();
    if generator_ready {
        tracing::info!(model = client.model(), endpoint = %config.llm.api_endpoint, "Colaborador de IA configurado");
    } else {
        tracing::warn!("LLM_API_KEY ausente: geração e avaliação vão falhar até ser configurada");
    }
    let gateway = Arc::new(QuestionGateway::new(Arc::new(client)));

    // Capacidade de 256 eventos; consumidores lentos perdem os mais antigos.
    let (events_tx, _) = broadcast::channel::<StudyEvent>(256);

    let orchestrator = Arc::new(Orchestrator::new(store, gateway, events_tx.clone()));
    let state = AppState {
        orchestrator,
        sessions: SessionTable::default(),
        events_tx,
        generator_ready,
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
