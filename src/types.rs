// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TIPOS COMPARTILHADOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Buffers de tamanho fixo trocados com o modelo e o mapa de offsets por janela.
// Todos os offsets são contados em caracteres (`char`), nunca em bytes.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Capacidade fixa de uma janela de inferência (em tokens).
pub const MAX_LENGTH: usize = 512;

/// Offset absoluto (em caracteres) de um ponto de corte no texto original.
pub type SplitPosition = usize;

/// Entrada do modelo para uma janela: os três arrays de tamanho fixo.
///
/// Invariantes:
/// - `attention_mask[i] == 1` para tokens reais e especiais, `0` para padding
/// - `token_type_ids` é sempre zero (entrada de segmento único)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWindow {
    /// Ids do vocabulário (`pad` após o comprimento efetivo)
    pub input_ids: Box<[i64; MAX_LENGTH]>,
    /// Máscara de atenção
    pub attention_mask: Box<[i64; MAX_LENGTH]>,
    /// Tipo de segmento (sempre 0)
    pub token_type_ids: Box<[i64; MAX_LENGTH]>,
    effective_len: usize,
}

impl EncodedWindow {
    /// Cria uma janela vazia preenchida com `pad_id` e máscara zerada.
    pub fn padded(pad_id: i64) -> Self {
        Self {
            input_ids: Box::new([pad_id; MAX_LENGTH]),
            attention_mask: Box::new([0; MAX_LENGTH]),
            token_type_ids: Box::new([0; MAX_LENGTH]),
            effective_len: 0,
        }
    }

    /// Anexa um token real/especial. Retorna `false` se a janela já está cheia.
    pub(crate) fn push(&mut self, id: i64) -> bool {
        if self.effective_len >= MAX_LENGTH {
            return false;
        }
        self.input_ids[self.effective_len] = id;
        self.attention_mask[self.effective_len] = 1;
        self.effective_len += 1;
        true
    }

    /// Número de posições com `attention_mask == 1`.
    pub fn effective_len(&self) -> usize {
        self.effective_len
    }
}

/// Matriz de scores `MAX_LENGTH × 2` devolvida pelo modelo.
///
/// Coluna 0 = "não-fronteira", coluna 1 = "fronteira".
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    logits: Box<[[f32; 2]; MAX_LENGTH]>,
}

impl ScoreMatrix {
    /// Matriz com todos os scores zerados.
    pub fn zeros() -> Self {
        Self {
            logits: Box::new([[0.0; 2]; MAX_LENGTH]),
        }
    }

    /// Constrói a matriz linha a linha a partir de uma função do índice do token.
    pub fn from_fn(mut f: impl FnMut(usize) -> [f32; 2]) -> Self {
        let mut matrix = Self::zeros();
        for (i, row) in matrix.logits.iter_mut().enumerate() {
            *row = f(i);
        }
        matrix
    }

    /// Define os scores de uma posição. Índices fora da janela são ignorados.
    pub fn set(&mut self, index: usize, row: [f32; 2]) {
        if let Some(slot) = self.logits.get_mut(index) {
            *slot = row;
        }
    }

    /// Scores `[não-fronteira, fronteira]` da posição `index`.
    pub fn row(&self, index: usize) -> [f32; 2] {
        self.logits[index]
    }

    /// Número de linhas (sempre `MAX_LENGTH`).
    pub fn len(&self) -> usize {
        MAX_LENGTH
    }

    /// Sempre `false`: a matriz tem tamanho fixo.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Itera sobre as linhas em ordem de token.
    pub fn rows(&self) -> impl Iterator<Item = &[f32; 2]> {
        self.logits.iter()
    }
}

/// Mapa índice de token → offset de caractere relativo ao início da janela.
///
/// `None` é o sentinela "não é caractere do texto" (cls/sep). Índices além
/// do comprimento efetivo (padding) também resolvem para `None`.
/// Construído do zero a cada janela e nunca compartilhado entre chamadas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenOffsetMap {
    offsets: Vec<Option<usize>>,
}

impl TokenOffsetMap {
    /// Cria um mapa vazio com capacidade reservada.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(capacity),
        }
    }

    /// Registra um token especial (sem posição no texto).
    pub fn push_special(&mut self) {
        self.offsets.push(None);
    }

    /// Registra um token de caractere no offset relativo `offset`.
    pub fn push_char(&mut self, offset: usize) {
        debug_assert!(
            self.offsets.iter().rev().flatten().next().map_or(true, |&last| last < offset),
            "offsets must be strictly increasing"
        );
        self.offsets.push(Some(offset));
    }

    /// Offset do token `index`, ou `None` para especiais/padding.
    pub fn char_offset(&self, index: usize) -> Option<usize> {
        self.offsets.get(index).copied().flatten()
    }

    /// Número de tokens mapeados (comprimento efetivo da janela).
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// `true` se nenhum token foi registrado.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Quantos caracteres do texto couberam nesta janela.
    pub fn char_count(&self) -> usize {
        self.offsets.iter().filter(|o| o.is_some()).count()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.offsets.truncate(len);
    }
}
