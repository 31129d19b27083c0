//! Benchmarks do pipeline de chunking.
//!
//! Testa performance de:
//! - Tokenização de uma janela cheia
//! - Extração de fronteiras de uma matriz de scores
//! - Montagem dos chunks
//! - Chunking completo com scorer mock (sem custo de inferência)
//!
//! Executar: `cargo bench --bench chunking_bench`

use bert_chunker::{
    assemble_chunks, extract_boundaries, BertChunker, LogitsThreshold, MockScorer, ScoreMatrix,
    SpecialTokens, Vocabulary, WindowedTokenizer, MAX_LENGTH,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::sync::Arc;

const VOCAB: &str = "[PAD]\n[UNK]\n[CLS]\n[SEP]\n[MASK]\na\nb\nc\nd\ne\n.\n";
const SPECIALS: &str = r#"{"cls_token": "[CLS]", "sep_token": "[SEP]", "unk_token": "[UNK]", "pad_token": "[PAD]", "mask_token": "[MASK]"}"#;

fn tokenizer() -> WindowedTokenizer {
    let vocab = Vocabulary::from_lines(VOCAB).unwrap();
    let specials = SpecialTokens::from_json(SPECIALS, &vocab).unwrap();
    WindowedTokenizer::new(Arc::new(vocab), &specials).unwrap()
}

/// Gera texto aleatório com ~1 ponto final a cada `sentence` caracteres
fn generate_text(len: usize, sentence: usize) -> String {
    let mut rng = rand::thread_rng();
    let letters = ['a', 'b', 'c', 'd', 'e', ' ', 'x'];
    (0..len)
        .map(|_| {
            if rng.gen_range(0..sentence) == 0 {
                '.'
            } else {
                letters[rng.gen_range(0..letters.len())]
            }
        })
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Tokenização
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_tokenize(c: &mut Criterion) {
    let tokenizer = tokenizer();
    let chars: Vec<char> = generate_text(MAX_LENGTH, 40).chars().collect();

    c.bench_function("tokenize_full_window", |bencher| {
        bencher.iter(|| black_box(tokenizer.tokenize(&chars)))
    });
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Extração de fronteiras
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_extract(c: &mut Criterion) {
    let tokenizer = tokenizer();
    let chars: Vec<char> = generate_text(MAX_LENGTH, 40).chars().collect();
    let window = tokenizer.tokenize(&chars);

    let mut rng = rand::thread_rng();
    let scores = ScoreMatrix::from_fn(|_| [rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0)]);

    let mut group = c.benchmark_group("extract_boundaries");
    for p in [0.1f32, 0.5, 0.9] {
        let threshold = LogitsThreshold::from_probability(p).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(p), &threshold, |bencher, t| {
            bencher.iter(|| black_box(extract_boundaries(&scores, &window.offsets, 0, *t)))
        });
    }
    group.finish();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Montagem
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_assemble(c: &mut Criterion) {
    let text = generate_text(100_000, 80);
    let positions: Vec<usize> = (1..100_000).step_by(97).collect();

    let mut group = c.benchmark_group("assemble_chunks");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("100k_chars", |bencher| {
        bencher.iter(|| black_box(assemble_chunks(&text, &positions)))
    });
    group.finish();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BENCHMARK: Pipeline completo (scorer mock)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn bench_chunk_text(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let tokenizer = tokenizer();
    let period = tokenizer.vocab().id(".").unwrap();
    let chunker = BertChunker::new(tokenizer, Arc::new(MockScorer::on_input_ids([period])));

    let mut group = c.benchmark_group("chunk_text");
    group.sample_size(30);

    for len in [1_000usize, 10_000, 100_000] {
        let text = generate_text(len, 120);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("mock_scorer", len), &text, |bencher, text| {
            bencher
                .to_async(&runtime)
                .iter(|| async { black_box(chunker.chunk_text(text, 0.5).await.unwrap()) })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_extract,
    bench_assemble,
    bench_chunk_text,
);

criterion_main!(benches);
