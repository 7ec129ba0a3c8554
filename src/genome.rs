//! The grid genome: construction, cloning, mutation, active-node analysis,
//! topological evaluation and fitness scoring.

use crate::{
    engine::{Observer, Phase},
    function::FunctionSet,
    node::{Node, Pos},
    random::roll,
};
use fxhash::FxHashSet;
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{error::Error, fs, path::Path};

/// One candidate program: a `cols x rows` grid of [Node]s with a cached
/// fitness and the inactive set from the most recent analysis.
///
/// Nodes reference their inputs by grid position, never by pointer, so the
/// derived `Clone` yields a topologically identical grid that shares nothing
/// with its source: mutating a clone is never observable on the parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome<V> {
    rows: usize,
    cols: usize,
    levels_back: usize,
    grid: Vec<Node<V>>,
    fitness: usize,
    #[serde(skip)]
    inactive: FxHashSet<Pos>,
}

impl<V: Clone + PartialEq> Genome<V> {
    /// Build a fresh genome: column 0 becomes start nodes, then a full
    /// mutation pass at rate 1.0 randomizes every function and wire.
    /// Ids are assigned column-major from 0, so a clone and its source carry
    /// comparable ids.
    pub fn new(
        rows: usize,
        cols: usize,
        levels_back: usize,
        funcs: &FunctionSet<V>,
        rng: &mut impl Rng,
    ) -> Self {
        assert!(rows > 0 && cols > 0, "grid dimensions must be positive");

        let mut grid = Vec::with_capacity(cols * rows);
        let mut id = 0;
        for col in 0..cols {
            for row in 0..rows {
                grid.push(Node::new(id, Pos::new(col, row), col == 0));
                id += 1;
            }
        }

        let mut genome = Self {
            rows,
            cols,
            levels_back,
            grid,
            fitness: 0,
            inactive: FxHashSet::default(),
        };
        genome.mutate(1., funcs, rng);
        genome
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn levels_back(&self) -> usize {
        self.levels_back
    }

    /// Fitness from the most recent [Genome::score] pass.
    pub fn fitness(&self) -> usize {
        self.fitness
    }

    fn index(&self, pos: Pos) -> usize {
        debug_assert!(pos.col < self.cols && pos.row < self.rows);
        pos.col * self.rows + pos.row
    }

    pub fn node(&self, pos: Pos) -> &Node<V> {
        &self.grid[self.index(pos)]
    }

    fn node_mut(&mut self, pos: Pos) -> &mut Node<V> {
        let idx = self.index(pos);
        &mut self.grid[idx]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<V>> {
        self.grid.iter()
    }

    /// Nodes classified dead during the most recent
    /// [Genome::evaluation_order] pass.
    pub fn inactive(&self) -> &FxHashSet<Pos> {
        &self.inactive
    }

    /// For every non-start node, three independent decisions each firing
    /// with probability `rate`: reassign its function, its first input, its
    /// second input. A node can have 0 to 3 fields changed in one pass.
    pub fn mutate(&mut self, rate: f64, funcs: &FunctionSet<V>, rng: &mut impl Rng) {
        for col in 1..self.cols {
            for row in 0..self.rows {
                let pos = Pos::new(col, row);
                if roll(rng, rate) {
                    let func = funcs.choose(rng);
                    self.node_mut(pos).set_func(func);
                }
                if roll(rng, rate) {
                    let input = self.select_input(col, rng);
                    self.node_mut(pos).set_input0(input);
                }
                if roll(rng, rate) {
                    let input = self.select_input(col, rng);
                    self.node_mut(pos).set_input1(input);
                }
            }
        }
    }

    /// Pick an input position for a node in `col`. Half of all picks land on
    /// a start node ( unconditionally when `col == 1`, where no other column
    /// is reachable ), keeping shallow circuits reachable on large grids.
    /// Otherwise a column strictly before `col`, at most `levels_back` back.
    /// `levels_back == 0` leaves the input unset: no legal predecessor.
    fn select_input(&self, col: usize, rng: &mut impl Rng) -> Option<Pos> {
        if self.levels_back == 0 {
            return None;
        }
        let row = rng.random_range(0..self.rows);
        if rng.random::<f64>() > 0.5 || col == 1 {
            return Some(Pos::new(0, row));
        }
        let reach = (col as f64 - rng.random::<f64>() * self.levels_back as f64) as usize;
        Some(Pos::new(reach.clamp(1, col - 1), row))
    }

    /// Active-node analysis. Scans columns output-to-input: a node is active
    /// if it sits in the output column or was referenced by an already-active
    /// node. Pushing actives onto a stack during that scan means the reversed
    /// stack is already a valid inputs-before-dependents order, with no sort.
    /// Caches the complement as [Genome::inactive].
    pub fn evaluation_order(&mut self) -> Vec<Pos> {
        let mut stack = Vec::with_capacity(self.grid.len());
        let mut referenced = FxHashSet::default();
        let mut inactive = FxHashSet::default();

        let out_col = self.cols - 1;
        for col in (0..self.cols).rev() {
            for row in 0..self.rows {
                let pos = Pos::new(col, row);
                if col == out_col || referenced.contains(&pos) {
                    stack.push(pos);
                    let (i0, i1) = self.node(pos).inputs();
                    referenced.extend(i0);
                    referenced.extend(i1);
                } else {
                    inactive.insert(pos);
                }
            }
        }

        self.inactive = inactive;
        stack.reverse();
        stack
    }

    /// Clear every node value ahead of a scoring pass.
    pub fn reset_values(&mut self) {
        for node in self.grid.iter_mut() {
            node.set_value(None);
        }
    }

    /// Compute one node's value from its inputs. A no-op for start nodes,
    /// whose values are assigned externally. Panics if the node is unwired or
    /// an input has no value yet: the evaluation order rules both out, so
    /// hitting either is an engine bug.
    fn evaluate_node(&mut self, pos: Pos, funcs: &FunctionSet<V>) {
        let node = self.node(pos);
        if node.is_start() {
            return;
        }

        let func = node
            .func()
            .unwrap_or_else(|| panic!("node ({},{}) has no function", pos.col, pos.row));
        let (i0, i1) = node.inputs();
        let value = {
            let fetch = |input: Option<Pos>| {
                let from = input
                    .unwrap_or_else(|| panic!("node ({},{}) is unwired", pos.col, pos.row));
                self.node(from).value().cloned().unwrap_or_else(|| {
                    panic!(
                        "node ({},{}) read input ({},{}) before it was evaluated",
                        pos.col, pos.row, from.col, from.row
                    )
                })
            };
            funcs.get(func).apply(&fetch(i0), &fetch(i1))
        };
        self.node_mut(pos).set_value(Some(value));
    }

    /// Score this genome against the test-case tables: per case, assign the
    /// input row to column 0, evaluate active nodes in topological order,
    /// then compare the output column against the expected row, skipping
    /// rows flagged in `ignored`. A case passes only if every non-ignored
    /// row matches exactly; fitness is the count of passed cases, cached.
    ///
    /// The evaluation order is computed once and reused for every case;
    /// topology cannot change mid-score. Panics if a non-ignored output has
    /// no value, rather than silently passing or failing the case.
    pub fn score(
        &mut self,
        funcs: &FunctionSet<V>,
        case_inputs: &[Vec<V>],
        case_outputs: &[Vec<V>],
        ignored: &[bool],
        phase: Phase,
        observer: &mut impl Observer<V>,
    ) -> usize {
        self.reset_values();
        let order = self.evaluation_order();
        let out_col = self.cols - 1;

        let mut fitness = 0;
        for (inputs, expected) in case_inputs.iter().zip(case_outputs) {
            for (row, value) in inputs.iter().enumerate() {
                self.node_mut(Pos::new(0, row)).set_value(Some(value.clone()));
            }

            for &pos in order.iter() {
                self.evaluate_node(pos, funcs);
                observer.node_evaluated(self.node(pos), phase);
            }

            let mut passed = true;
            for row in 0..self.rows {
                if ignored.get(row).copied().unwrap_or(false) {
                    continue;
                }
                let actual = self.node(Pos::new(out_col, row)).value().unwrap_or_else(|| {
                    panic!("output node ({out_col},{row}) has no value after evaluation")
                });
                if *actual != expected[row] {
                    passed = false;
                }
            }
            if passed {
                fitness += 1;
            }
        }

        self.fitness = fitness;
        fitness
    }

    /// Every node on some path from the output column back to a start node.
    /// Introspection only; scoring relies on [Genome::evaluation_order].
    pub fn connected_to_inputs(&self) -> FxHashSet<Pos> {
        let mut path = FxHashSet::default();
        for row in 0..self.rows {
            self.reaches_start(Pos::new(self.cols - 1, row), &mut path);
        }
        path
    }

    fn reaches_start(&self, pos: Pos, path: &mut FxHashSet<Pos>) -> bool {
        if self.node(pos).is_start() {
            path.insert(pos);
            return true;
        }
        let (i0, i1) = self.node(pos).inputs();
        let hit = i0.is_some_and(|p| self.reaches_start(p, path))
            | i1.is_some_and(|p| self.reaches_start(p, path));
        if hit {
            path.insert(pos);
        }
        hit
    }
}

impl<V: Clone + PartialEq + Serialize + DeserializeOwned> Genome<V> {
    #[allow(clippy::inherent_to_string)]
    pub fn to_string(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        serde_json::from_str(s).map_err(|op| op.into())
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
