// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CHUNKER - Janela Deslizante
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Orquestra tokenize → score → extract sobre o texto inteiro:
// - Achou fronteiras: a próxima janela começa exatamente na última
// - Não achou: avança MAX_LENGTH / 2 (ou o que resta do texto)
//
// O cursor `window_start` é estritamente crescente, então o loop sempre
// termina. Todo estado (cursor, mapa de offsets) é local à chamada.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assembler::{assemble_chunks, AssembledChunks};
use crate::config::{ChunkerConfig, DEFAULT_PROB_THRESHOLD};
use crate::extractor::{extract_boundaries, LogitsThreshold};
use crate::scorer::{BoundaryScorer, HttpScorer, InferenceError};
use crate::tokenizer::{TokenizedWindow, WindowedTokenizer};
use crate::types::{EncodedWindow, ScoreMatrix, SplitPosition, MAX_LENGTH};
use crate::vocab::{ConfigError, SpecialTokens, Vocabulary};

/// Avanço usado quando uma janela não tem nenhuma fronteira.
pub const FALLBACK_STRIDE: usize = MAX_LENGTH / 2;

/// Erros da operação pública de chunking
#[derive(Debug, thiserror::Error)]
pub enum ChunkerError {
    /// Texto vazio ou limiar fora de (0, 1)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Falha ao carregar recursos no startup
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Falha do scorer (transporte, formato ou timeout)
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Cancelado entre janelas; `processed` é o offset alcançado
    #[error("Chunking cancelled after {processed} characters")]
    Cancelled {
        /// Caracteres já percorridos pelo cursor
        processed: usize,
    },
}

/// Sinal de cancelamento verificado entre janelas.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Cria um sinal ainda não acionado.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aciona o cancelamento.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Verifica se o cancelamento foi acionado.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Opções de execução do chunker
#[derive(Debug, Clone)]
pub struct ChunkerOptions {
    /// Timeout por chamada ao scorer (None = sem limite)
    pub score_timeout: Option<Duration>,
    /// Limiar usado por [`BertChunker::chunk`]
    pub prob_threshold: f32,
}

impl Default for ChunkerOptions {
    fn default() -> Self {
        Self {
            score_timeout: None,
            prob_threshold: DEFAULT_PROB_THRESHOLD,
        }
    }
}

/// Resultado detalhado de uma chamada de chunking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkReport {
    /// Chunks em ordem; concatenados reproduzem o texto
    pub chunks: Vec<String>,
    /// Intervalo `[start, end)` de cada chunk, em caracteres
    pub spans: Vec<(usize, usize)>,
    /// Pontos de corte absolutos, estritamente crescentes
    pub split_positions: Vec<SplitPosition>,
    /// Início de cada janela pontuada, na ordem
    pub window_starts: Vec<usize>,
    /// Quantas janelas avançaram pelo passo de fallback
    pub fallback_steps: usize,
}

impl ChunkReport {
    /// Número de janelas enviadas ao scorer.
    pub fn windows(&self) -> usize {
        self.window_starts.len()
    }

    /// Retorna o número de chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Retorna true se não há chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Chunker semântico baseado em um modelo BERT de classificação de tokens.
///
/// Pode ser compartilhado entre tasks (`Arc<BertChunker>`): o vocabulário
/// é somente leitura e cada chamada mantém seu próprio estado.
pub struct BertChunker {
    tokenizer: WindowedTokenizer,
    scorer: Arc<dyn BoundaryScorer>,
    options: ChunkerOptions,
}

impl BertChunker {
    /// Cria um chunker com opções padrão.
    pub fn new(tokenizer: WindowedTokenizer, scorer: Arc<dyn BoundaryScorer>) -> Self {
        Self {
            tokenizer,
            scorer,
            options: ChunkerOptions::default(),
        }
    }

    /// Substitui as opções de execução.
    pub fn with_options(mut self, options: ChunkerOptions) -> Self {
        self.options = options;
        self
    }

    /// Carrega vocabulário, special tokens e cria o [`HttpScorer`].
    ///
    /// Qualquer falha aqui é fatal (startup).
    pub fn from_config(config: &ChunkerConfig) -> Result<Self, ChunkerError> {
        let vocab = Vocabulary::from_file(&config.vocab_path)?;
        let specials = SpecialTokens::from_file(&config.special_tokens_path, &vocab)?;
        let tokenizer = WindowedTokenizer::new(Arc::new(vocab), &specials)?;

        let scorer = match config.score_timeout {
            Some(timeout) => HttpScorer::with_timeout(config.scorer_url.clone(), timeout)?,
            None => HttpScorer::new(config.scorer_url.clone()),
        };
        log::info!("🔌 Scorer HTTP: {}", scorer.endpoint());

        Ok(Self::new(tokenizer, Arc::new(scorer)).with_options(ChunkerOptions {
            score_timeout: config.score_timeout,
            prob_threshold: config.prob_threshold,
        }))
    }

    /// Tokenizer em uso.
    pub fn tokenizer(&self) -> &WindowedTokenizer {
        &self.tokenizer
    }

    /// Opções em uso.
    pub fn options(&self) -> &ChunkerOptions {
        &self.options
    }

    /// Divide o texto usando o limiar configurado em [`ChunkerOptions`].
    pub async fn chunk(&self, text: &str) -> Result<Vec<String>, ChunkerError> {
        self.chunk_text(text, self.options.prob_threshold).await
    }

    /// Divide o texto em chunks semânticos.
    ///
    /// `prob_threshold` ∈ (0, 1): valores menores geram mais chunks.
    pub async fn chunk_text(
        &self,
        text: &str,
        prob_threshold: f32,
    ) -> Result<Vec<String>, ChunkerError> {
        Ok(self.chunk_text_detailed(text, prob_threshold).await?.chunks)
    }

    /// Como [`chunk_text`](Self::chunk_text), devolvendo o relatório completo.
    pub async fn chunk_text_detailed(
        &self,
        text: &str,
        prob_threshold: f32,
    ) -> Result<ChunkReport, ChunkerError> {
        self.chunk_text_with_cancel(text, prob_threshold, &CancellationFlag::new())
            .await
    }

    /// Chunking com cancelamento cooperativo entre janelas.
    ///
    /// Se `cancel` for acionado, retorna [`ChunkerError::Cancelled`] com o
    /// offset alcançado. Um erro do scorer aborta a chamada inteira.
    pub async fn chunk_text_with_cancel(
        &self,
        text: &str,
        prob_threshold: f32,
        cancel: &CancellationFlag,
    ) -> Result<ChunkReport, ChunkerError> {
        let threshold = LogitsThreshold::from_probability(prob_threshold).ok_or_else(|| {
            ChunkerError::InvalidArgument(format!(
                "prob_threshold must be in (0, 1), got {prob_threshold}"
            ))
        })?;
        if text.is_empty() {
            return Err(ChunkerError::InvalidArgument(
                "text must not be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        log::info!("✂️  Processando {} caracteres...", total);

        let mut report = ChunkReport::default();
        let mut window_start = 0usize;

        while window_start < total {
            if cancel.is_cancelled() {
                log::warn!("🛑 Chunking cancelado em {}/{} caracteres", window_start, total);
                return Err(ChunkerError::Cancelled {
                    processed: window_start,
                });
            }

            let window_end = total.min(window_start + MAX_LENGTH);
            let TokenizedWindow { encoding, offsets } =
                self.tokenizer.tokenize(&chars[window_start..window_end]);

            let scores = self.score_window(&encoding).await?;
            let found = extract_boundaries(&scores, &offsets, window_start, threshold);
            report.window_starts.push(window_start);

            match found.last().copied() {
                Some(last) => {
                    debug_assert!(last > window_start);
                    log::debug!(
                        "janela {}..{}: {} fronteiras, próxima em {}",
                        window_start,
                        window_end,
                        found.len(),
                        last
                    );
                    report.split_positions.extend(found);
                    window_start = last;
                }
                None => {
                    let step = FALLBACK_STRIDE.min(total - window_start);
                    log::debug!(
                        "janela {}..{}: sem fronteiras, avançando {}",
                        window_start,
                        window_end,
                        step
                    );
                    report.fallback_steps += 1;
                    window_start += step;
                }
            }
        }

        let AssembledChunks { chunks, spans } = assemble_chunks(text, &report.split_positions);
        report.chunks = chunks;
        report.spans = spans;

        log::info!(
            "⏱️  Chunking completado em {}ms: {} chunks, {} janelas",
            started.elapsed().as_millis(),
            report.chunks.len(),
            report.windows()
        );
        Ok(report)
    }

    /// Processa vários documentos de forma concorrente.
    ///
    /// Cada documento é uma chamada independente; a ordem de saída
    /// corresponde à de entrada.
    pub async fn chunk_documents<S: AsRef<str>>(
        &self,
        texts: &[S],
        prob_threshold: f32,
    ) -> Vec<Result<Vec<String>, ChunkerError>> {
        join_all(
            texts
                .iter()
                .map(|text| self.chunk_text(text.as_ref(), prob_threshold)),
        )
        .await
    }

    async fn score_window(&self, encoding: &EncodedWindow) -> Result<ScoreMatrix, InferenceError> {
        match self.options.score_timeout {
            Some(limit) => tokio::time::timeout(limit, self.scorer.score(encoding))
                .await
                .map_err(|_| InferenceError::Timeout(limit.as_millis() as u64))?,
            None => self.scorer.score(encoding).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::MockBoundaryScorer;

    fn tokenizer() -> WindowedTokenizer {
        let vocab = Vocabulary::from_lines("a\nb\n[UNK]\n[PAD]\n[CLS]\n[SEP]\n").unwrap();
        let specials = SpecialTokens::from_json(
            r#"{"cls_token": "[CLS]", "sep_token": "[SEP]", "unk_token": "[UNK]", "pad_token": "[PAD]"}"#,
            &vocab,
        )
        .unwrap();
        WindowedTokenizer::new(Arc::new(vocab), &specials).unwrap()
    }

    fn non_boundary() -> ScoreMatrix {
        ScoreMatrix::from_fn(|_| [5.0, 0.0])
    }

    #[tokio::test]
    async fn test_rejects_invalid_threshold() {
        let chunker = BertChunker::new(tokenizer(), Arc::new(MockBoundaryScorer::new()));
        for p in [0.0, 1.0, -1.0, f32::NAN] {
            let err = chunker.chunk_text("ab", p).await.unwrap_err();
            assert!(matches!(err, ChunkerError::InvalidArgument(_)));
        }
    }

    #[tokio::test]
    async fn test_rejects_empty_text() {
        let chunker = BertChunker::new(tokenizer(), Arc::new(MockBoundaryScorer::new()));
        let err = chunker.chunk_text("", 0.5).await.unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_scorer_error_aborts_without_partial_result() {
        let mut scorer = MockBoundaryScorer::new();
        scorer
            .expect_score()
            .times(1)
            .returning(|_| Err(InferenceError::Backend("model crashed".into())));

        let chunker = BertChunker::new(tokenizer(), Arc::new(scorer));
        let text = "a".repeat(3 * MAX_LENGTH);
        let err = chunker.chunk_text(&text, 0.5).await.unwrap_err();
        assert!(matches!(err, ChunkerError::Inference(InferenceError::Backend(_))));
    }

    #[tokio::test]
    async fn test_error_after_first_window_still_aborts() {
        let mut scorer = MockBoundaryScorer::new();
        let mut seq = mockall::Sequence::new();
        scorer
            .expect_score()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ScoreMatrix::from_fn(|_| [5.0, 0.0])));
        scorer
            .expect_score()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(InferenceError::Timeout(10)));

        let chunker = BertChunker::new(tokenizer(), Arc::new(scorer));
        let text = "b".repeat(2 * MAX_LENGTH);
        let err = chunker.chunk_text_detailed(&text, 0.5).await.unwrap_err();
        assert!(matches!(err, ChunkerError::Inference(InferenceError::Timeout(10))));
    }

    #[tokio::test]
    async fn test_fallback_stride_window_count() {
        // 1000 caracteres sem fronteiras: 0, 256, 512, 768 → 4 janelas
        let mut scorer = MockBoundaryScorer::new();
        scorer
            .expect_score()
            .times(4)
            .returning(|_| Ok(non_boundary()));

        let chunker = BertChunker::new(tokenizer(), Arc::new(scorer));
        let text = "a".repeat(1000);
        let report = chunker.chunk_text_detailed(&text, 0.5).await.unwrap();

        assert_eq!(report.window_starts, vec![0, 256, 512, 768]);
        assert_eq!(report.fallback_steps, 4);
        assert_eq!(report.chunks, vec![text]);
    }

    #[tokio::test]
    async fn test_window_sees_text_from_cursor() {
        let mut scorer = MockBoundaryScorer::new();
        scorer
            .expect_score()
            .withf(|window| window.input_ids[0] == 4 && window.input_ids[1] == 1)
            .times(1)
            .returning(|_| Ok(non_boundary()));

        let chunker = BertChunker::new(tokenizer(), Arc::new(scorer));
        let report = chunker.chunk_text_detailed("bab", 0.5).await.unwrap();
        assert_eq!(report.chunks, vec!["bab"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_window() {
        let scorer = MockBoundaryScorer::new();
        let chunker = BertChunker::new(tokenizer(), Arc::new(scorer));
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let err = chunker
            .chunk_text_with_cancel("abab", 0.5, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Cancelled { processed: 0 }));
    }

    #[test]
    fn test_options_default() {
        let options = ChunkerOptions::default();
        assert!(options.score_timeout.is_none());
        assert_eq!(options.prob_threshold, DEFAULT_PROB_THRESHOLD);
    }
}
