//! Run configuration and the (1+lambda) evolutionary loop.

use crate::{
    function::{Function, FunctionSet},
    genome::Genome,
    node::Node,
};
use rand::Rng;
use std::error::Error;

pub const DEFAULT_GENERATION_SIZE: usize = 100;
pub const DEFAULT_MUTATION_RATE: f64 = 0.20;

/// Which stage of the run an observer callback fires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Generation 0: independently initialized genomes.
    Seeding,
    /// Every later generation: mutated clones of the incumbent.
    Refining,
}

/// Synchronous read-only callbacks for an external observer, e.g. a
/// visualizer rendering intermediate state. Both default to no-ops and the
/// engine's behavior never depends on them.
pub trait Observer<V> {
    /// Fires after an individual's fitness has been computed.
    fn individual_scored(&mut self, _genome: &Genome<V>, _phase: Phase) {}

    /// Fires after each node evaluation within a scoring pass.
    fn node_evaluated(&mut self, _node: &Node<V>, _phase: Phase) {}
}

/// The observer that observes nothing.
pub struct Silent;

impl<V> Observer<V> for Silent {}

/// Outcome of an [Cgp::evolve] run: the final incumbent, how many
/// generations ( seeding included ) were completed, and whether maximum
/// fitness was reached or the generation cap cut the run short.
#[derive(Debug)]
pub struct Evolved<V> {
    pub champion: Genome<V>,
    pub generations: usize,
    pub solved: bool,
}

/// Immutable run configuration plus the evolutionary loop. Built with the
/// consuming setters, then driven by [Cgp::evolve]; nothing about the
/// configuration changes once evolution starts.
pub struct Cgp<V> {
    rows: usize,
    cols: usize,
    levels_back: usize,
    generation_size: usize,
    mutation_rate: f64,
    generation_cap: Option<usize>,
    functions: FunctionSet<V>,
    case_inputs: Vec<Vec<V>>,
    case_outputs: Vec<Vec<V>>,
    ignored_outputs: Vec<usize>,
}

/// The replacement rule: an offspring whose fitness merely equals the
/// incumbent's still takes over. Neutral drift at a fitness plateau is
/// deliberate, letting topology keep moving when scores cannot.
fn replaces(offspring: usize, incumbent: usize) -> bool {
    offspring >= incumbent
}

impl<V: Clone + PartialEq> Cgp<V> {
    pub fn new(rows: usize, cols: usize, levels_back: usize) -> Self {
        Self {
            rows,
            cols,
            levels_back,
            generation_size: DEFAULT_GENERATION_SIZE,
            mutation_rate: DEFAULT_MUTATION_RATE,
            generation_cap: None,
            functions: FunctionSet::new(),
            case_inputs: Vec::new(),
            case_outputs: Vec::new(),
            ignored_outputs: Vec::new(),
        }
    }

    pub fn generation_size(mut self, size: usize) -> Self {
        self.generation_size = size;
        self
    }

    pub fn mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Safety valve: stop after `cap` completed generations even without a
    /// perfect individual. Unset by default, leaving the loop unbounded.
    pub fn generation_cap(mut self, cap: usize) -> Self {
        self.generation_cap = Some(cap);
        self
    }

    /// Register one operation of the problem's function set.
    pub fn function(mut self, f: Function<V>) -> Self {
        self.functions.push(f);
        self
    }

    /// Supply the parallel test-case tables. Each input and output row must
    /// be exactly `rows` wide; both tables must have the same length.
    pub fn fitness_cases(mut self, inputs: Vec<Vec<V>>, outputs: Vec<Vec<V>>) -> Self {
        self.case_inputs = inputs;
        self.case_outputs = outputs;
        self
    }

    /// Mark output row indexes to skip while scoring. Useful when a grid
    /// needs many rows for its inputs but only some outputs are relevant.
    pub fn ignore_outputs(mut self, indexes: &[usize]) -> Self {
        self.ignored_outputs.extend_from_slice(indexes);
        self
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.rows == 0 || self.cols == 0 {
            return Err("grid dimensions must be positive".into());
        }
        if self.levels_back == 0 {
            return Err("levels-back must be at least 1".into());
        }
        if self.generation_size == 0 {
            return Err("generation size must be positive".into());
        }
        if !(0. ..=1.).contains(&self.mutation_rate) {
            return Err("mutation rate must be within [0, 1]".into());
        }
        if self.functions.is_empty() {
            return Err("function set is empty".into());
        }
        if self.case_inputs.is_empty() {
            return Err("no fitness cases configured".into());
        }
        if self.case_inputs.len() != self.case_outputs.len() {
            return Err(format!(
                "{} input cases against {} output cases",
                self.case_inputs.len(),
                self.case_outputs.len()
            )
            .into());
        }
        for (idx, case) in self.case_inputs.iter().enumerate() {
            if case.len() != self.rows {
                return Err(format!(
                    "input case {idx} is {} wide, grid has {} rows",
                    case.len(),
                    self.rows
                )
                .into());
            }
        }
        for (idx, case) in self.case_outputs.iter().enumerate() {
            if case.len() != self.rows {
                return Err(format!(
                    "output case {idx} is {} wide, grid has {} rows",
                    case.len(),
                    self.rows
                )
                .into());
            }
        }
        if let Some(bad) = self.ignored_outputs.iter().find(|i| **i >= self.rows) {
            return Err(format!("ignored output row {bad} is outside the grid").into());
        }
        Ok(())
    }

    fn ignored_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.rows];
        for idx in self.ignored_outputs.iter() {
            mask[*idx] = true;
        }
        mask
    }

    /// Run seeding then refinement to completion and return the final
    /// incumbent. Blocks until fitness reaches the case count, or until the
    /// generation cap if one was set; with no cap an unsatisfiable case
    /// table loops forever.
    pub fn evolve(
        &self,
        rng: &mut impl Rng,
        observer: &mut impl Observer<V>,
    ) -> Result<Evolved<V>, Box<dyn Error>> {
        self.validate()?;

        let total = self.case_inputs.len();
        let mask = self.ignored_mask();

        // SEEDING: independently initialized genomes, strict `>` so the
        // first-seen individual wins ties
        let mut fittest: Option<Genome<V>> = None;
        for _ in 0..self.generation_size {
            let mut genome =
                Genome::new(self.rows, self.cols, self.levels_back, &self.functions, rng);
            genome.score(
                &self.functions,
                &self.case_inputs,
                &self.case_outputs,
                &mask,
                Phase::Seeding,
                observer,
            );
            observer.individual_scored(&genome, Phase::Seeding);
            if fittest.as_ref().is_none_or(|f| genome.fitness() > f.fitness()) {
                fittest = Some(genome);
            }
        }
        let mut fittest = fittest.expect("generation size is validated nonzero");
        let mut generations = 1;

        // REFINING: offspring are processed in sequence and an accepted one
        // becomes the parent of the remaining offspring in its generation
        while fittest.fitness() < total {
            if self.generation_cap.is_some_and(|cap| generations >= cap) {
                return Ok(Evolved {
                    champion: fittest,
                    generations,
                    solved: false,
                });
            }

            for _ in 0..self.generation_size {
                let mut offspring = fittest.clone();
                offspring.mutate(self.mutation_rate, &self.functions, rng);
                offspring.score(
                    &self.functions,
                    &self.case_inputs,
                    &self.case_outputs,
                    &mask,
                    Phase::Refining,
                    observer,
                );
                observer.individual_scored(&offspring, Phase::Refining);
                if replaces(offspring.fitness(), fittest.fitness()) {
                    fittest = offspring;
                }
            }
            generations += 1;
        }

        Ok(Evolved {
            champion: fittest,
            generations,
            solved: true,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::WyRng;

    fn and() -> Function<bool> {
        Function::new("AND", |a: &bool, b: &bool| a & b)
    }

    fn identity_run() -> Cgp<bool> {
        // a 1x2 grid whose only legal wiring feeds the start node into AND,
        // so every seeded genome already computes the identity
        Cgp::new(1, 2, 1)
            .function(and())
            .fitness_cases(
                vec![vec![true], vec![false]],
                vec![vec![true], vec![false]],
            )
    }

    #[test]
    fn equal_fitness_offspring_replaces_the_incumbent() {
        assert!(replaces(3, 3));
        assert!(replaces(4, 3));
        assert!(!replaces(2, 3));
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let mut rng = WyRng::seeded(1);
        for (cgp, want) in [
            (Cgp::<bool>::new(0, 3, 1), "grid dimensions"),
            (Cgp::<bool>::new(2, 3, 0), "levels-back"),
            (Cgp::new(1, 2, 1).function(and()), "no fitness cases"),
            (identity_run().generation_size(0), "generation size"),
            (identity_run().mutation_rate(1.5), "mutation rate"),
            (
                Cgp::new(1, 2, 1).fitness_cases(vec![vec![true]], vec![vec![true]]),
                "function set",
            ),
            (
                identity_run().fitness_cases(vec![vec![true]], vec![]),
                "output cases",
            ),
            (
                identity_run().fitness_cases(vec![vec![true, false]], vec![vec![true]]),
                "input case 0",
            ),
            (
                identity_run().fitness_cases(vec![vec![true]], vec![vec![true, false]]),
                "output case 0",
            ),
            (identity_run().ignore_outputs(&[1]), "ignored output"),
        ] {
            let err = cgp
                .evolve(&mut rng, &mut Silent)
                .err()
                .unwrap_or_else(|| panic!("configuration accepted, wanted {want:?}"))
                .to_string();
            assert!(err.contains(want), "{err:?} missing {want:?}");
        }
    }

    #[test]
    fn trivial_problem_solves_while_seeding() {
        let mut rng = WyRng::seeded(2);
        let out = identity_run()
            .generation_size(20)
            .evolve(&mut rng, &mut Silent)
            .unwrap();
        assert!(out.solved);
        assert_eq!(out.generations, 1);
        assert_eq!(out.champion.fitness(), 2);
    }

    #[test]
    fn capped_run_returns_unsolved_champion() {
        // XOR with an AND-only function set is unsatisfiable
        let mut rng = WyRng::seeded(3);
        let out = Cgp::new(1, 3, 1)
            .function(and())
            .fitness_cases(
                vec![vec![true], vec![false]],
                vec![vec![false], vec![true]],
            )
            .generation_size(10)
            .generation_cap(25)
            .evolve(&mut rng, &mut Silent)
            .unwrap();
        assert!(!out.solved);
        assert_eq!(out.generations, 25);
        assert!(out.champion.fitness() < 2);
    }

    #[test]
    fn hooks_fire_for_both_phases() {
        #[derive(Default)]
        struct Counter {
            seeded: usize,
            refined: usize,
            nodes: usize,
        }
        impl Observer<bool> for Counter {
            fn individual_scored(&mut self, _: &Genome<bool>, phase: Phase) {
                match phase {
                    Phase::Seeding => self.seeded += 1,
                    Phase::Refining => self.refined += 1,
                }
            }
            fn node_evaluated(&mut self, _: &Node<bool>, _: Phase) {
                self.nodes += 1;
            }
        }

        let mut rng = WyRng::seeded(4);
        let mut counter = Counter::default();
        let out = Cgp::new(1, 3, 1)
            .function(and())
            .fitness_cases(
                vec![vec![true], vec![false]],
                vec![vec![false], vec![true]],
            )
            .generation_size(10)
            .generation_cap(5)
            .evolve(&mut rng, &mut counter)
            .unwrap();
        assert!(!out.solved);
        assert_eq!(counter.seeded, 10);
        assert_eq!(counter.refined, 4 * 10);
        assert!(counter.nodes > 0);
    }
}
