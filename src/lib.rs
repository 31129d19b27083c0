//! # BERT Chunker
//!
//! Este crate divide textos longos em chunks semanticamente coerentes usando
//! um modelo de classificação de tokens (BERT) que marca cada caractere como
//! "fronteira" ou "não-fronteira".
//!
//! ## O problema
//!
//! O modelo aceita no máximo 512 tokens por chamada. Para textos de qualquer
//! tamanho o crate:
//! 1. Tokeniza o texto caractere a caractere, mantendo o offset de cada token
//! 2. Envia janelas de tamanho fixo ao modelo
//! 3. Extrai as fronteiras com um limiar de probabilidade
//! 4. Desliza a janela até a última fronteira encontrada (ou meia janela)
//! 5. Recorta o texto original nos offsets absolutos
//!
//! Garantias: o loop sempre termina, nenhum caractere é perdido ou duplicado
//! e a concatenação dos chunks é idêntica ao texto de entrada.
//!
//! ## Arquitetura
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | `vocab` | vocab.txt + special_tokens_map.json |
//! | `tokenizer` | janela → input_ids / attention_mask / token_type_ids |
//! | `scorer` | trait `BoundaryScorer` (HTTP + mock) |
//! | `extractor` | logits → pontos de corte absolutos |
//! | `chunker` | janela deslizante |
//! | `assembler` | pontos de corte → chunks |
//!
//! ## Exemplo de Uso
//!
//! ```rust,ignore
//! use bert_chunker::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ChunkerError> {
//!     let chunker = BertChunker::from_config(&load_chunker_config())?;
//!     let chunks = chunker.chunk_text("Primeiro assunto. Outro assunto.", 0.5).await?;
//!     for chunk in chunks {
//!         println!("{chunk}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Constantes e buffers de tamanho fixo compartilhados.
///
/// - [`MAX_LENGTH`]: capacidade da janela (512)
/// - [`EncodedWindow`]: os três arrays de entrada do modelo
/// - [`ScoreMatrix`]: logits `MAX_LENGTH × 2`
/// - [`TokenOffsetMap`]: índice de token → offset de caractere
pub mod types;

/// Vocabulário e tokens especiais (carregados uma vez no startup).
pub mod vocab;

/// Tokenizer por caractere com saída de tamanho fixo.
pub mod tokenizer;

/// Interface com o modelo de fronteiras.
///
/// Define a trait [`BoundaryScorer`] e implementações para:
/// - Servidor de inferência HTTP ([`HttpScorer`])
/// - Mock determinístico para testes ([`MockScorer`])
pub mod scorer;

/// Regra de limiar e extração de pontos de corte por janela.
pub mod extractor;

/// Montagem dos chunks a partir dos pontos de corte.
pub mod assembler;

/// Controlador da janela deslizante e API pública de chunking.
pub mod chunker;

/// Configuração via variáveis de ambiente.
///
/// - `CHUNKER_VOCAB_PATH`: caminho do vocab.txt
/// - `CHUNKER_SPECIAL_TOKENS_PATH`: caminho do special_tokens_map.json
/// - `CHUNKER_SCORER_URL`: URL do servidor de inferência
/// - `CHUNKER_SCORE_TIMEOUT_MS`: timeout por janela (0 desliga)
/// - `CHUNKER_PROB_THRESHOLD`: limiar padrão (padrão: 0.5)
pub mod config;

// Re-exports principais
pub use assembler::{assemble_chunks, AssembledChunks};
pub use chunker::{BertChunker, CancellationFlag, ChunkReport, ChunkerError, ChunkerOptions};
pub use config::{load_chunker_config, ChunkerConfig, DEFAULT_PROB_THRESHOLD};
pub use extractor::{extract_boundaries, LogitsThreshold};
pub use scorer::{BoundaryScorer, HttpScorer, InferenceError, MockRule, MockScorer};
pub use tokenizer::{SpecialIds, TokenizedWindow, WindowedTokenizer};
pub use types::*;
pub use vocab::{ConfigError, SpecialToken, SpecialTokenRole, SpecialTokens, Vocabulary};

/// Versão da biblioteca.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude com imports comuns para uso rápido.
///
/// ```rust,ignore
/// use bert_chunker::prelude::*;
/// ```
pub mod prelude {
    pub use crate::chunker::{BertChunker, CancellationFlag, ChunkReport, ChunkerError};
    pub use crate::config::{load_chunker_config, ChunkerConfig};
    pub use crate::scorer::{BoundaryScorer, HttpScorer, InferenceError, MockScorer};
    pub use crate::tokenizer::WindowedTokenizer;
    pub use crate::types::{SplitPosition, MAX_LENGTH};
    pub use crate::vocab::{SpecialTokens, Vocabulary};
}
