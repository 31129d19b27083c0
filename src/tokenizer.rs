// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TOKENIZER POR JANELA
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Converte o texto de uma janela em [CLS] c1 c2 ... cn [SEP] [PAD]...
// Cada caractere é um token independente (sem merge de subpalavras).
// Junto com os arrays, devolve o mapa token → offset de caractere da janela.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::sync::Arc;

use crate::types::{EncodedWindow, TokenOffsetMap, MAX_LENGTH};
use crate::vocab::{ConfigError, SpecialTokenRole, SpecialTokens, Vocabulary};

/// Ids dos tokens especiais, resolvidos uma única vez na construção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialIds {
    /// `[CLS]`, sempre no índice 0
    pub cls: i64,
    /// `[SEP]`, logo após o último caractere (se couber)
    pub sep: i64,
    /// Caracteres fora do vocabulário
    pub unk: i64,
    /// Preenchimento até `MAX_LENGTH`
    pub pad: i64,
}

/// Resultado da tokenização de uma janela.
#[derive(Debug, Clone)]
pub struct TokenizedWindow {
    /// Arrays de entrada do modelo
    pub encoding: EncodedWindow,
    /// Mapa índice de token → offset relativo de caractere
    pub offsets: TokenOffsetMap,
}

/// Tokenizer de caracteres com saída de tamanho fixo.
///
/// Barato de clonar: o vocabulário é compartilhado via `Arc`.
#[derive(Debug, Clone)]
pub struct WindowedTokenizer {
    vocab: Arc<Vocabulary>,
    ids: SpecialIds,
}

impl WindowedTokenizer {
    /// Cria o tokenizer validando cls/sep/unk/pad contra o vocabulário.
    pub fn new(vocab: Arc<Vocabulary>, specials: &SpecialTokens) -> Result<Self, ConfigError> {
        let ids = SpecialIds {
            cls: specials.id_of(SpecialTokenRole::Cls, &vocab)?,
            sep: specials.id_of(SpecialTokenRole::Sep, &vocab)?,
            unk: specials.id_of(SpecialTokenRole::Unk, &vocab)?,
            pad: specials.id_of(SpecialTokenRole::Pad, &vocab)?,
        };
        Ok(Self { vocab, ids })
    }

    /// Ids especiais resolvidos.
    pub fn special_ids(&self) -> SpecialIds {
        self.ids
    }

    /// Vocabulário compartilhado.
    pub fn vocab(&self) -> &Arc<Vocabulary> {
        &self.vocab
    }

    /// Id de um caractere, ou `unk` se não estiver no vocabulário.
    pub fn char_id(&self, c: char) -> i64 {
        let mut buf = [0u8; 4];
        self.vocab.id(c.encode_utf8(&mut buf)).unwrap_or(self.ids.unk)
    }

    /// Tokeniza o texto da janela atual.
    ///
    /// A sequência `[CLS] + chars + [SEP]` é truncada em `MAX_LENGTH`;
    /// caracteres que não couberem ficam para uma janela seguinte.
    pub fn tokenize(&self, window: &[char]) -> TokenizedWindow {
        let mut encoding = EncodedWindow::padded(self.ids.pad);
        let mut offsets = TokenOffsetMap::with_capacity(MAX_LENGTH);

        encoding.push(self.ids.cls);
        offsets.push_special();

        for (offset, &c) in window.iter().enumerate() {
            if !encoding.push(self.char_id(c)) {
                break;
            }
            offsets.push_char(offset);
        }

        if encoding.push(self.ids.sep) {
            offsets.push_special();
        }

        offsets.truncate(encoding.effective_len());
        TokenizedWindow { encoding, offsets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> WindowedTokenizer {
        let vocab = Vocabulary::from_lines("a\nb\n[UNK]\n[PAD]\n[CLS]\n[SEP]\n").unwrap();
        let specials = SpecialTokens::from_json(
            r#"{"cls_token": "[CLS]", "sep_token": "[SEP]", "unk_token": "[UNK]", "pad_token": "[PAD]"}"#,
            &vocab,
        )
        .unwrap();
        WindowedTokenizer::new(Arc::new(vocab), &specials).unwrap()
    }

    #[test]
    fn test_special_ids_resolved() {
        let ids = tokenizer().special_ids();
        assert_eq!(ids, SpecialIds { cls: 4, sep: 5, unk: 2, pad: 3 });
    }

    #[test]
    fn test_tokenize_short_window() {
        let chars: Vec<char> = "abz".chars().collect();
        let tokenized = tokenizer().tokenize(&chars);
        let enc = &tokenized.encoding;

        assert_eq!(&enc.input_ids[..6], &[4, 0, 1, 2, 5, 3]);
        assert_eq!(&enc.attention_mask[..6], &[1, 1, 1, 1, 1, 0]);
        assert!(enc.input_ids[5..].iter().all(|&id| id == 3));
        assert!(enc.token_type_ids.iter().all(|&t| t == 0));
        assert_eq!(enc.effective_len(), 5);

        let map = &tokenized.offsets;
        assert_eq!(map.len(), 5);
        assert_eq!(map.char_offset(0), None);
        assert_eq!(map.char_offset(1), Some(0));
        assert_eq!(map.char_offset(3), Some(2));
        assert_eq!(map.char_offset(4), None);
    }

    #[test]
    fn test_tokenize_empty_window() {
        let tokenized = tokenizer().tokenize(&[]);
        assert_eq!(tokenized.encoding.effective_len(), 2);
        assert_eq!(&tokenized.encoding.input_ids[..3], &[4, 5, 3]);
        assert_eq!(tokenized.offsets.char_count(), 0);
    }

    #[test]
    fn test_tokenize_truncates_full_window() {
        let chars = vec!['a'; MAX_LENGTH];
        let tokenized = tokenizer().tokenize(&chars);

        // [CLS] + 511 caracteres, sem espaço para o [SEP]
        assert_eq!(tokenized.encoding.effective_len(), MAX_LENGTH);
        assert!(tokenized.encoding.attention_mask.iter().all(|&m| m == 1));
        assert_eq!(tokenized.encoding.input_ids[MAX_LENGTH - 1], 0);
        assert_eq!(tokenized.offsets.char_count(), MAX_LENGTH - 1);
        assert_eq!(
            tokenized.offsets.char_offset(MAX_LENGTH - 1),
            Some(MAX_LENGTH - 2)
        );
    }

    #[test]
    fn test_tokenize_exactly_fits_with_sep() {
        let chars = vec!['b'; MAX_LENGTH - 2];
        let tokenized = tokenizer().tokenize(&chars);
        assert_eq!(tokenized.encoding.effective_len(), MAX_LENGTH);
        assert_eq!(tokenized.encoding.input_ids[MAX_LENGTH - 1], 5);
        assert_eq!(tokenized.offsets.char_offset(MAX_LENGTH - 1), None);
    }

    #[test]
    fn test_multibyte_chars_are_single_tokens() {
        let chars: Vec<char> = "日本".chars().collect();
        let tokenized = tokenizer().tokenize(&chars);
        assert_eq!(tokenized.encoding.effective_len(), 4);
        assert_eq!(&tokenized.encoding.input_ids[1..3], &[2, 2]);
        assert_eq!(tokenized.offsets.char_offset(2), Some(1));
    }
}
