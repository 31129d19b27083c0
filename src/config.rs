// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CONFIGURAÇÃO DO CHUNKER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Caminhos dos recursos do modelo, endpoint do scorer e limiares.
// Todas as configurações podem ser definidas via variáveis de ambiente.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::path::PathBuf;
use std::time::Duration;

/// Limiar de probabilidade padrão.
pub const DEFAULT_PROB_THRESHOLD: f32 = 0.5;

/// Timeout padrão por janela enviada ao scorer.
pub const DEFAULT_SCORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuração de startup do chunker.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkerConfig {
    /// Caminho do vocab.txt (um token por linha).
    pub vocab_path: PathBuf,

    /// Caminho do special_tokens_map.json.
    pub special_tokens_path: PathBuf,

    /// URL base do servidor de inferência.
    pub scorer_url: String,

    /// Timeout por chamada ao scorer. `None` desliga o limite.
    pub score_timeout: Option<Duration>,

    /// Limiar usado quando o chamador não informa um.
    /// Valores menores geram mais chunks.
    pub prob_threshold: f32,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            vocab_path: PathBuf::from("onnx/vocab.txt"),
            special_tokens_path: PathBuf::from("onnx/special_tokens_map.json"),
            scorer_url: "http://localhost:8000".to_string(),
            score_timeout: Some(DEFAULT_SCORE_TIMEOUT),
            prob_threshold: DEFAULT_PROB_THRESHOLD,
        }
    }
}

/// Carrega configuração do chunker a partir das variáveis de ambiente.
///
/// Variáveis suportadas:
/// - `CHUNKER_VOCAB_PATH`: caminho do vocab.txt
/// - `CHUNKER_SPECIAL_TOKENS_PATH`: caminho do special_tokens_map.json
/// - `CHUNKER_SCORER_URL`: URL do servidor de inferência
/// - `CHUNKER_SCORE_TIMEOUT_MS`: timeout por janela (0 = sem timeout)
/// - `CHUNKER_PROB_THRESHOLD`: limiar padrão, estritamente entre 0 e 1
///
/// Valores inválidos são ignorados (com warning) e o padrão é mantido.
///
/// # Exemplo
///
/// ```rust,ignore
/// // .env
/// CHUNKER_SCORER_URL=http://inference:8000
/// CHUNKER_PROB_THRESHOLD=0.3
///
/// // código
/// let config = load_chunker_config();
/// let chunker = BertChunker::from_config(&config)?;
/// ```
pub fn load_chunker_config() -> ChunkerConfig {
    load_chunker_config_from(|key| std::env::var(key).ok())
}

/// Mesmo que [`load_chunker_config`], lendo de uma fonte arbitrária.
pub fn load_chunker_config_from(get: impl Fn(&str) -> Option<String>) -> ChunkerConfig {
    let mut config = ChunkerConfig::default();

    if let Some(path) = get("CHUNKER_VOCAB_PATH") {
        log::info!("📦 CHUNKER_VOCAB_PATH={}", path);
        config.vocab_path = PathBuf::from(path);
    }

    if let Some(path) = get("CHUNKER_SPECIAL_TOKENS_PATH") {
        log::info!("📦 CHUNKER_SPECIAL_TOKENS_PATH={}", path);
        config.special_tokens_path = PathBuf::from(path);
    }

    if let Some(url) = get("CHUNKER_SCORER_URL") {
        log::info!("📦 CHUNKER_SCORER_URL={}", url);
        config.scorer_url = url;
    }

    if let Some(timeout_str) = get("CHUNKER_SCORE_TIMEOUT_MS") {
        match timeout_str.trim().parse::<u64>() {
            Ok(0) => {
                config.score_timeout = None;
                log::info!("📦 CHUNKER_SCORE_TIMEOUT_MS=0 (sem timeout)");
            }
            Ok(ms) => {
                config.score_timeout = Some(Duration::from_millis(ms));
                log::info!("📦 CHUNKER_SCORE_TIMEOUT_MS={}", ms);
            }
            Err(_) => log::warn!("⚠️  CHUNKER_SCORE_TIMEOUT_MS inválido: {}", timeout_str),
        }
    }

    if let Some(prob_str) = get("CHUNKER_PROB_THRESHOLD") {
        match prob_str.trim().parse::<f32>() {
            Ok(p) if p > 0.0 && p < 1.0 => {
                config.prob_threshold = p;
                log::info!("📦 CHUNKER_PROB_THRESHOLD={}", p);
            }
            _ => log::warn!(
                "⚠️  CHUNKER_PROB_THRESHOLD deve estar entre 0 e 1 (exclusivo): {}",
                prob_str
            ),
        }
    }

    config
}
