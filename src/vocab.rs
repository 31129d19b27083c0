// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// VOCABULÁRIO E SPECIAL TOKENS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Carregamento único (startup) dos recursos do modelo:
// - vocab.txt: um token por linha, o número da linha (0-based) é o id
// - special_tokens_map.json: papel (cls_token, sep_token...) → SpecialToken
//
// Depois de carregados são somente leitura e podem ser compartilhados via Arc.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

/// Erros de configuração (fatais no startup)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Arquivo de recurso ausente ou ilegível
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Caminho que falhou
        path: String,
        /// Erro de I/O original
        #[source]
        source: std::io::Error,
    },

    /// JSON malformado
    #[error("Invalid special tokens map: {0}")]
    Json(#[from] serde_json::Error),

    /// Papel obrigatório ausente no special_tokens_map.json
    #[error("Special tokens map is missing required role: {0}")]
    MissingRole(SpecialTokenRole),

    /// Token especial que não existe no vocab.txt
    #[error("Special token {content:?} ({role}) not found in vocabulary")]
    TokenNotInVocab {
        /// Chave do papel (ex: "cls_token")
        role: String,
        /// Conteúdo do token
        content: String,
    },

    /// vocab.txt sem nenhuma linha
    #[error("Vocabulary is empty")]
    EmptyVocabulary,
}

fn read_resource(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// VOCABULÁRIO
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tabela token → id, imutável após o carregamento.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: HashMap<String, i64>,
    lines: usize,
}

impl Vocabulary {
    /// Carrega o vocabulário a partir do conteúdo de um vocab.txt.
    ///
    /// Cada linha é aparada (trim). Se um token se repete, vale a última linha.
    pub fn from_lines(data: &str) -> Result<Self, ConfigError> {
        let mut ids = HashMap::new();
        let mut lines = 0usize;

        for (id, line) in data.lines().enumerate() {
            ids.insert(line.trim().to_string(), id as i64);
            lines = id + 1;
        }

        if lines == 0 {
            return Err(ConfigError::EmptyVocabulary);
        }

        log::info!("📚 Vocabulário carregado com {} tokens", ids.len());
        Ok(Self { ids, lines })
    }

    /// Carrega o vocabulário de um arquivo.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = read_resource(path.as_ref())?;
        Self::from_lines(&data)
    }

    /// Id do token, se existir.
    pub fn id(&self, token: &str) -> Option<i64> {
        self.ids.get(token).copied()
    }

    /// `true` se o token existe no vocabulário.
    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(token)
    }

    /// Número de linhas lidas (maior id + 1).
    pub fn len(&self) -> usize {
        self.lines
    }

    /// `true` se nenhuma linha foi carregada.
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SPECIAL TOKENS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Papel de um token especial no special_tokens_map.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialTokenRole {
    /// Início de sequência
    Cls,
    /// Fim de sequência
    Sep,
    /// Caractere fora do vocabulário
    Unk,
    /// Preenchimento
    Pad,
    /// Máscara (não usada na inferência, mas validada se presente)
    Mask,
}

impl SpecialTokenRole {
    /// Papéis sem os quais o tokenizer não funciona.
    pub const REQUIRED: [SpecialTokenRole; 4] = [
        SpecialTokenRole::Cls,
        SpecialTokenRole::Sep,
        SpecialTokenRole::Unk,
        SpecialTokenRole::Pad,
    ];

    /// Todos os papéis reconhecidos no special_tokens_map.json.
    pub const ALL: [SpecialTokenRole; 5] = [
        SpecialTokenRole::Cls,
        SpecialTokenRole::Sep,
        SpecialTokenRole::Unk,
        SpecialTokenRole::Pad,
        SpecialTokenRole::Mask,
    ];

    /// Papel correspondente a uma chave do JSON.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }

    /// Chave correspondente no JSON.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Cls => "cls_token",
            Self::Sep => "sep_token",
            Self::Unk => "unk_token",
            Self::Pad => "pad_token",
            Self::Mask => "mask_token",
        }
    }
}

impl fmt::Display for SpecialTokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Definição de um token especial.
///
/// As flags de pré/pós-processamento são todas `false` no modelo suportado;
/// são carregadas e expostas, mas não alteram a tokenização por caractere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialToken {
    /// Texto do token (ex: "[CLS]")
    pub content: String,
    /// Remover espaços à esquerda
    #[serde(default)]
    pub lstrip: bool,
    /// Remover espaços à direita
    #[serde(default)]
    pub rstrip: bool,
    /// Aplicar normalização
    #[serde(default)]
    pub normalized: bool,
    /// Exigir palavra inteira
    #[serde(default, alias = "singleWord")]
    pub single_word: bool,
}

impl SpecialToken {
    /// Token especial com todas as flags desligadas.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            lstrip: false,
            rstrip: false,
            normalized: false,
            single_word: false,
        }
    }
}

/// Formato aceito por papel: objeto completo ou string curta.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSpecialToken {
    Short(String),
    Full(SpecialToken),
}

impl From<RawSpecialToken> for SpecialToken {
    fn from(raw: RawSpecialToken) -> Self {
        match raw {
            RawSpecialToken::Short(content) => SpecialToken::plain(content),
            RawSpecialToken::Full(token) => token,
        }
    }
}

/// Tabela de tokens especiais, validada contra o vocabulário.
#[derive(Debug, Clone, Default)]
pub struct SpecialTokens {
    tokens: BTreeMap<String, SpecialToken>,
}

impl SpecialTokens {
    /// Faz o parse do special_tokens_map.json e valida contra `vocab`.
    ///
    /// Falha se faltar algum papel obrigatório ou se algum `content`
    /// (inclusive de papéis opcionais) não existir no vocabulário.
    /// Chaves que não são papéis (ex: `additional_special_tokens`) são ignoradas.
    pub fn from_json(json: &str, vocab: &Vocabulary) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;

        let mut tokens = BTreeMap::new();
        for (key, value) in raw {
            if SpecialTokenRole::from_key(&key).is_none() {
                log::debug!("special_tokens_map: ignorando chave {}", key);
                continue;
            }
            let token: RawSpecialToken = serde_json::from_value(value)?;
            tokens.insert(key, token.into());
        }
        Self::from_map(tokens, vocab)
    }

    /// Carrega e valida a partir de um arquivo.
    pub fn from_file(path: impl AsRef<Path>, vocab: &Vocabulary) -> Result<Self, ConfigError> {
        let json = read_resource(path.as_ref())?;
        Self::from_json(&json, vocab)
    }

    /// Valida uma tabela já montada.
    pub fn from_map(
        tokens: BTreeMap<String, SpecialToken>,
        vocab: &Vocabulary,
    ) -> Result<Self, ConfigError> {
        for role in SpecialTokenRole::REQUIRED {
            if !tokens.contains_key(role.key()) {
                return Err(ConfigError::MissingRole(role));
            }
        }

        for (role, token) in &tokens {
            if !vocab.contains(&token.content) {
                return Err(ConfigError::TokenNotInVocab {
                    role: role.clone(),
                    content: token.content.clone(),
                });
            }
        }

        log::info!(
            "🔖 Special tokens carregados: {:?}",
            tokens.keys().collect::<Vec<_>>()
        );
        Ok(Self { tokens })
    }

    /// Token de um papel, se configurado.
    pub fn get(&self, role: SpecialTokenRole) -> Option<&SpecialToken> {
        self.tokens.get(role.key())
    }

    /// Resolve o id de vocabulário de um papel.
    pub fn id_of(&self, role: SpecialTokenRole, vocab: &Vocabulary) -> Result<i64, ConfigError> {
        let token = self.get(role).ok_or(ConfigError::MissingRole(role))?;
        vocab
            .id(&token.content)
            .ok_or_else(|| ConfigError::TokenNotInVocab {
                role: role.key().to_string(),
                content: token.content.clone(),
            })
    }

    /// Nomes dos papéis carregados, em ordem alfabética.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}
