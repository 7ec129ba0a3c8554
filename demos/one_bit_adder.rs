//! Evolves a one-bit adder: two inputs, carry on output row 0, sum on row 1.

use cgp::{random::default_rng, Cgp, Function, FunctionSet, Genome, Observer, Phase};

struct Progress {
    scored: usize,
}

impl Observer<bool> for Progress {
    fn individual_scored(&mut self, genome: &Genome<bool>, phase: Phase) {
        self.scored += 1;
        if self.scored % 1_000 == 0 {
            println!(
                "{:?}: {} individuals scored, latest fitness {}",
                phase,
                self.scored,
                genome.fitness()
            );
        }
    }
}

fn main() {
    let funcs: FunctionSet<bool> = [
        Function::new("XOR", |a: &bool, b: &bool| a ^ b),
        Function::new("OR", |a: &bool, b: &bool| a | b),
        Function::new("AND", |a: &bool, b: &bool| a & b),
        Function::new("NAND", |a: &bool, b: &bool| !(a & b)),
    ]
    .into_iter()
    .collect();

    let mut run = Cgp::new(2, 4, 2);
    for idx in 0..funcs.len() {
        run = run.function(funcs.get(idx).clone());
    }
    let run = run.fitness_cases(
        vec![
            vec![false, false],
            vec![false, true],
            vec![true, false],
            vec![true, true],
        ],
        vec![
            vec![false, false],
            vec![false, true],
            vec![false, true],
            vec![true, false],
        ],
    );

    let out = run
        .evolve(&mut default_rng(), &mut Progress { scored: 0 })
        .expect("valid configuration");

    println!(
        "solved in {} generations, fitness {}",
        out.generations,
        out.champion.fitness()
    );
    for node in out.champion.nodes() {
        let tag = if out.champion.inactive().contains(&node.pos()) {
            "  (inactive)"
        } else {
            ""
        };
        println!("{}{}", node.describe(&funcs), tag);
    }
}
