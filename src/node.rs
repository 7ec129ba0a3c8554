use crate::function::FunctionSet;
use serde::{Deserialize, Serialize};

/// Grid coordinate of a node. Input references are stored as positions into
/// the owning genome's grid rather than as pointers, so a cloned grid is
/// independent of its source by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub col: usize,
    pub row: usize,
}

impl Pos {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// One cell of the genome grid: either a start node ( column 0, value set
/// externally per test case ) or a two-input function application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node<V> {
    id: usize,
    pos: Pos,
    start: bool,
    value: Option<V>,
    func: Option<usize>,
    input0: Option<Pos>,
    input1: Option<Pos>,
}

impl<V> Node<V> {
    pub(crate) fn new(id: usize, pos: Pos, start: bool) -> Self {
        Self {
            id,
            pos,
            start,
            value: None,
            func: None,
            input0: None,
            input1: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn is_start(&self) -> bool {
        self.start
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: Option<V>) {
        self.value = value;
    }

    /// Index of this node's function in the run's [FunctionSet], if assigned.
    pub fn func(&self) -> Option<usize> {
        self.func
    }

    pub(crate) fn set_func(&mut self, func: usize) {
        self.func = Some(func);
    }

    pub fn inputs(&self) -> (Option<Pos>, Option<Pos>) {
        (self.input0, self.input1)
    }

    pub(crate) fn set_input0(&mut self, input: Option<Pos>) {
        self.input0 = input;
    }

    pub(crate) fn set_input1(&mut self, input: Option<Pos>) {
        self.input1 = input;
    }
}

impl<V: core::fmt::Debug> Node<V> {
    /// One-line summary for observers and demos: id, wiring, function name,
    /// current value.
    pub fn describe(&self, funcs: &FunctionSet<V>) -> String {
        if self.start {
            return format!("NODE {}: start val:{:?}", self.id, self.value);
        }
        let input = |i: Option<Pos>| match i {
            Some(p) => format!("({},{})", p.col, p.row),
            None => "nothing".into(),
        };
        format!(
            "NODE {}: in0->{} in1->{} {} val:{:?}",
            self.id,
            input(self.input0),
            input(self.input1),
            self.func.map_or("no-func", |f| funcs.get(f).name()),
            self.value,
        )
    }
}
