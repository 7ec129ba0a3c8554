//! Evolves a two-bit multiplier: rows 0-1 hold one operand, rows 2-3 the
//! other, and the output column carries the four product bits.

use cgp::{random::default_rng, Cgp, Function, FunctionSet, Silent};

fn bits2(n: usize) -> [bool; 2] {
    [n & 0b10 != 0, n & 0b01 != 0]
}

fn bits4(n: usize) -> [bool; 4] {
    [n & 0b1000 != 0, n & 0b100 != 0, n & 0b10 != 0, n & 0b1 != 0]
}

fn main() {
    let funcs: FunctionSet<bool> = [
        Function::new("XOR", |a: &bool, b: &bool| a ^ b),
        Function::new("OR", |a: &bool, b: &bool| a | b),
        Function::new("AND", |a: &bool, b: &bool| a & b),
        Function::new("ANDi", |a: &bool, b: &bool| !a & b),
    ]
    .into_iter()
    .collect();

    let mut inputs = Vec::with_capacity(16);
    let mut outputs = Vec::with_capacity(16);
    for a in 0..4 {
        for b in 0..4 {
            let [a1, a0] = bits2(a);
            let [b1, b0] = bits2(b);
            inputs.push(vec![a1, a0, b1, b0]);
            outputs.push(bits4(a * b).to_vec());
        }
    }

    let mut run = Cgp::new(4, 4, 2);
    for idx in 0..funcs.len() {
        run = run.function(funcs.get(idx).clone());
    }
    let run = run.fitness_cases(inputs, outputs);

    let out = run
        .evolve(&mut default_rng(), &mut Silent)
        .expect("valid configuration");

    println!(
        "solved in {} generations, fitness {}/16",
        out.generations,
        out.champion.fitness()
    );
    for node in out.champion.nodes() {
        println!("{}", node.describe(&funcs));
    }
}
