use cgp::{random::WyRng, Function, FunctionSet, Genome, Phase, Silent};
use criterion::Criterion;

fn gates() -> FunctionSet<bool> {
    [
        Function::new("AND", |a: &bool, b: &bool| a & b),
        Function::new("OR", |a: &bool, b: &bool| a | b),
        Function::new("XOR", |a: &bool, b: &bool| a ^ b),
        Function::new("NAND", |a: &bool, b: &bool| !(a & b)),
    ]
    .into_iter()
    .collect()
}

fn bench_genome(bench: &mut Criterion) {
    let funcs = gates();
    let mut rng = WyRng::seeded(0xbe9c);
    let genome = Genome::new(4, 16, 4, &funcs, &mut rng);

    let inputs: Vec<Vec<bool>> = (0..16)
        .map(|n| (0..4).map(|bit| n & (1 << bit) != 0).collect())
        .collect();
    let outputs = inputs.clone();

    bench.bench_function("clone-mutate", |b| {
        b.iter(|| {
            let mut child = genome.clone();
            child.mutate(0.2, &funcs, &mut rng);
            child
        })
    });

    bench.bench_function("evaluation-order", |b| {
        b.iter(|| genome.clone().evaluation_order())
    });

    bench.bench_function("score-16-cases", |b| {
        b.iter(|| {
            genome
                .clone()
                .score(&funcs, &inputs, &outputs, &[false; 4], Phase::Seeding, &mut Silent)
        })
    });
}

pub fn benches() {
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(500)
        .significance_level(0.1);
    bench_genome(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
