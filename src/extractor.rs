// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// EXTRAÇÃO DE FRONTEIRAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Percorre os logits de uma janela e devolve os pontos de corte absolutos.
//
// Regra: a posição i é fronteira se  logit[i][1] > logit[i][0] - T
// onde T = ln(1/p - 1). Quanto menor p, maior T e mais fronteiras.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::types::{ScoreMatrix, SplitPosition, TokenOffsetMap};

/// Limiar em espaço de logits derivado de `probThreshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitsThreshold(f64);

impl LogitsThreshold {
    /// Calcula `ln(1/p - 1)`.
    ///
    /// Retorna `None` se `p` não estiver estritamente dentro de (0, 1),
    /// o que também cobre NaN e infinitos.
    pub fn from_probability(prob_threshold: f32) -> Option<Self> {
        let p = f64::from(prob_threshold);
        if !(p > 0.0 && p < 1.0) {
            return None;
        }
        let threshold = (1.0 / p - 1.0).ln();
        threshold.is_finite().then_some(Self(threshold))
    }

    /// Valor de `T` em espaço de logits.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Aplica a regra de fronteira a uma linha de logits.
    pub fn is_boundary(&self, row: [f32; 2]) -> bool {
        f64::from(row[1]) > f64::from(row[0]) - self.0
    }
}

/// Extrai os pontos de corte absolutos de uma janela.
///
/// Ignora o índice 0 (cls), a última linha da matriz, tokens sem caractere
/// (sep/padding) e o offset 0 da janela. O resultado sai em ordem crescente.
pub fn extract_boundaries(
    scores: &ScoreMatrix,
    offsets: &TokenOffsetMap,
    window_start: usize,
    threshold: LogitsThreshold,
) -> Vec<SplitPosition> {
    let last = scores.len().saturating_sub(1);

    (1..last)
        .filter(|&i| threshold.is_boundary(scores.row(i)))
        .filter_map(|i| offsets.char_offset(i))
        .filter(|&offset| offset > 0)
        .map(|offset| window_start + offset)
        .collect()
}
