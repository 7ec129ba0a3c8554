pub mod engine;
pub mod function;
pub mod genome;
pub mod node;
pub mod random;

pub use engine::{Cgp, Evolved, Observer, Phase, Silent};
pub use function::{Function, FunctionSet};
pub use genome::Genome;
pub use node::{Node, Pos};
