// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SCORER DE FRONTEIRAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Trait e implementações para o modelo de classificação de tokens.
// O modelo recebe input_ids / attention_mask / token_type_ids (1 × 512) e
// devolve logits 1 × 512 × 2 ([não-fronteira, fronteira] por posição).
//
// Implementações:
// - HttpScorer: servidor de inferência externo via HTTP/JSON
// - MockScorer: fake determinístico para testes e benchmarks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::types::{EncodedWindow, ScoreMatrix, MAX_LENGTH};

/// Erros de inferência (fatais para a chamada de chunking em andamento)
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    /// Falha de conexão/envio
    #[error("Scorer transport error: {0}")]
    Transport(String),

    /// Resposta com status não-2xx
    #[error("Scorer returned status {status}: {body}")]
    Server {
        /// Status HTTP
        status: u16,
        /// Corpo da resposta (pode estar vazio)
        body: String,
    },

    /// Corpo que não é o JSON esperado
    #[error("Invalid scorer response: {0}")]
    Decode(String),

    /// Tensor com shape diferente de `1 × MAX_LENGTH × 2`
    #[error("Score shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape esperado
        expected: [usize; 3],
        /// Dimensões encontradas (até a primeira divergente)
        actual: Vec<usize>,
    },

    /// Janela excedeu o limite de tempo (ms)
    #[error("Scorer timeout after {0}ms")]
    Timeout(u64),

    /// Erro interno do backend de inferência
    #[error("Scorer backend error: {0}")]
    Backend(String),
}

/// Trait principal para o modelo de fronteiras
///
/// Só formata entrada/saída: nenhuma lógica de chunking vive aqui.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoundaryScorer: Send + Sync {
    /// Pontua uma janela, devolvendo a matriz `MAX_LENGTH × 2`.
    async fn score(&self, window: &EncodedWindow) -> Result<ScoreMatrix, InferenceError>;
}

const EXPECTED_SHAPE: [usize; 3] = [1, MAX_LENGTH, 2];

impl TryFrom<Vec<Vec<Vec<f32>>>> for ScoreMatrix {
    type Error = InferenceError;

    /// Converte o tensor `1 × MAX_LENGTH × 2` do modelo, validando o shape.
    fn try_from(logits: Vec<Vec<Vec<f32>>>) -> Result<Self, Self::Error> {
        let mismatch = |actual: Vec<usize>| InferenceError::ShapeMismatch {
            expected: EXPECTED_SHAPE,
            actual,
        };

        let [batch] = <[Vec<Vec<f32>>; 1]>::try_from(logits)
            .map_err(|v| mismatch(vec![v.len()]))?;
        if batch.len() != MAX_LENGTH {
            return Err(mismatch(vec![1, batch.len()]));
        }

        let mut matrix = ScoreMatrix::zeros();
        for (i, row) in batch.iter().enumerate() {
            match row.as_slice() {
                &[non_boundary, boundary] => matrix.set(i, [non_boundary, boundary]),
                other => return Err(mismatch(vec![1, MAX_LENGTH, other.len()])),
            }
        }
        Ok(matrix)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO HTTP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Corpo da requisição: cada array vai com batch 1 (`[[...]]`).
#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    input_ids: [&'a [i64]; 1],
    attention_mask: [&'a [i64]; 1],
    token_type_ids: [&'a [i64]; 1],
}

impl<'a> From<&'a EncodedWindow> for ScoreRequest<'a> {
    fn from(window: &'a EncodedWindow) -> Self {
        Self {
            input_ids: [&window.input_ids[..]],
            attention_mask: [&window.attention_mask[..]],
            token_type_ids: [&window.token_type_ids[..]],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    logits: Vec<Vec<Vec<f32>>>,
}

/// Cliente para um servidor de inferência do modelo de chunking
///
/// Faz `POST {endpoint}/score` com os três arrays e espera `{"logits": ...}`.
pub struct HttpScorer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpScorer {
    /// Cliente sem timeout próprio.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: None,
        }
    }

    /// Cliente com timeout de requisição no nível HTTP.
    ///
    /// Estouro do limite vira [`InferenceError::Timeout`], igual ao timeout
    /// aplicado pelo chunker.
    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout: Some(timeout),
        })
    }

    /// URL base configurada.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn score_url(&self) -> String {
        format!("{}/score", self.endpoint.trim_end_matches('/'))
    }

    fn request_error(&self, err: reqwest::Error) -> InferenceError {
        match self.timeout {
            Some(limit) if err.is_timeout() => InferenceError::Timeout(limit.as_millis() as u64),
            _ => InferenceError::Transport(err.to_string()),
        }
    }
}

#[async_trait]
impl BoundaryScorer for HttpScorer {
    async fn score(&self, window: &EncodedWindow) -> Result<ScoreMatrix, InferenceError> {
        let response = self
            .client
            .post(self.score_url())
            .json(&ScoreRequest::from(window))
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ScoreResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.request_error(e)
            } else {
                InferenceError::Decode(e.to_string())
            }
        })?;

        ScoreMatrix::try_from(payload.logits)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IMPLEMENTAÇÃO MOCK PARA TESTES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Regra que decide quais posições o mock marca como fronteira
#[derive(Debug, Clone)]
pub enum MockRule {
    /// Nenhuma fronteira
    Never,
    /// Todas as posições (inclusive cls/sep/padding)
    Always,
    /// Índices de token fixos dentro de cada janela
    TokenIndices(BTreeSet<usize>),
    /// Qualquer token real cujo id esteja no conjunto
    InputIds(BTreeSet<i64>),
    /// A mesma matriz para toda janela
    Fixed(ScoreMatrix),
}

/// Scorer determinístico
///
/// Posição marcada → `[0.0, margin]`; demais → `[margin, 0.0]`.
/// Com `probThreshold = 0.5` (limiar 0) isso reproduz exatamente a regra.
#[derive(Debug)]
pub struct MockScorer {
    rule: MockRule,
    margin: f32,
    delay: Option<Duration>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockScorer {
    /// Mock com a regra dada e margem 5.0.
    pub fn new(rule: MockRule) -> Self {
        Self {
            rule,
            margin: 5.0,
            delay: None,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Nunca marca fronteira.
    pub fn never() -> Self {
        Self::new(MockRule::Never)
    }

    /// Marca toda posição.
    pub fn always() -> Self {
        Self::new(MockRule::Always)
    }

    /// Marca os mesmos índices de token em toda janela.
    pub fn at_token_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self::new(MockRule::TokenIndices(indices.into_iter().collect()))
    }

    /// Marca tokens reais cujo id esteja no conjunto.
    pub fn on_input_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self::new(MockRule::InputIds(ids.into_iter().collect()))
    }

    /// Diferença de logits entre a classe vencedora e a perdedora.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Atrasa cada chamada (para testar timeout).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Faz toda chamada falhar com `InferenceError::Backend`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Número de janelas pontuadas até agora.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn is_boundary(&self, window: &EncodedWindow, index: usize) -> bool {
        match &self.rule {
            MockRule::Never | MockRule::Fixed(_) => false,
            MockRule::Always => true,
            MockRule::TokenIndices(indices) => indices.contains(&index),
            MockRule::InputIds(ids) => {
                window.attention_mask[index] == 1 && ids.contains(&window.input_ids[index])
            }
        }
    }
}

#[async_trait]
impl BoundaryScorer for MockScorer {
    async fn score(&self, window: &EncodedWindow) -> Result<ScoreMatrix, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(InferenceError::Backend(message.clone()));
        }
        if let MockRule::Fixed(matrix) = &self.rule {
            return Ok(matrix.clone());
        }

        let margin = self.margin;
        Ok(ScoreMatrix::from_fn(|i| {
            if self.is_boundary(window, i) {
                [0.0, margin]
            } else {
                [margin, 0.0]
            }
        }))
    }
}
