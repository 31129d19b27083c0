// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MONTAGEM DOS CHUNKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Recorta o texto original nos pontos de corte (offsets de caractere).
// A concatenação dos chunks é sempre igual ao texto original.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::types::SplitPosition;

/// Chunks e seus intervalos `[start, end)` em caracteres.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledChunks {
    /// Fatias do texto, em ordem
    pub chunks: Vec<String>,
    /// Intervalo de caracteres de cada fatia
    pub spans: Vec<(usize, usize)>,
}

/// Monta os chunks a partir dos pontos de corte ordenados.
///
/// Pontos fora de `(0, len)` ou que não sejam estritamente crescentes são
/// descartados. Dois pontos adjacentes geram um chunk de um caractere.
pub fn assemble_chunks(text: &str, positions: &[SplitPosition]) -> AssembledChunks {
    // byte_at[k] = offset em bytes do k-ésimo caractere; byte_at[len] = text.len()
    let byte_at: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = byte_at.len() - 1;

    let mut result = AssembledChunks::default();
    let mut previous = 0usize;

    for &pos in positions {
        if pos <= previous || pos >= char_len {
            continue;
        }
        result.chunks.push(text[byte_at[previous]..byte_at[pos]].to_string());
        result.spans.push((previous, pos));
        previous = pos;
    }

    if previous < char_len {
        result.chunks.push(text[byte_at[previous]..].to_string());
        result.spans.push((previous, char_len));
    }

    result
}
