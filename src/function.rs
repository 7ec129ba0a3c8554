use core::fmt::{self, Debug};
use rand::Rng;
use std::sync::Arc;

/// A named pure binary operation over the domain value type. Functions are
/// immutable once registered and shared by every node that selects them.
#[derive(Clone)]
pub struct Function<V> {
    name: String,
    op: Arc<dyn Fn(&V, &V) -> V + Send + Sync>,
}

impl<V> Function<V> {
    pub fn new(name: impl Into<String>, op: impl Fn(&V, &V) -> V + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            op: Arc::new(op),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, a: &V, b: &V) -> V {
        (self.op)(a, b)
    }
}

impl<V> Debug for Function<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

/// The set of operations a run is configured with. Nodes refer to members by
/// index, so a genome stays serializable and never owns a closure.
#[derive(Debug, Clone)]
pub struct FunctionSet<V>(Vec<Function<V>>);

impl<V> Default for FunctionSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FunctionSet<V> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, f: Function<V>) {
        self.0.push(f);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Function<V> {
        &self.0[idx]
    }

    /// Uniformly random member index. Panics on an empty set; the engine
    /// validates nonemptiness before evolution starts.
    pub fn choose(&self, rng: &mut impl Rng) -> usize {
        rng.random_range(0..self.0.len())
    }
}

impl<V> FromIterator<Function<V>> for FunctionSet<V> {
    fn from_iter<T: IntoIterator<Item = Function<V>>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::random::WyRng;

    fn gates() -> FunctionSet<bool> {
        [
            Function::new("AND", |a: &bool, b: &bool| a & b),
            Function::new("OR", |a: &bool, b: &bool| a | b),
            Function::new("XOR", |a: &bool, b: &bool| a ^ b),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn apply_and_name() {
        let set = gates();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(2).name(), "XOR");
        assert!(set.get(2).apply(&true, &false));
        assert!(!set.get(0).apply(&true, &false));
    }

    #[test]
    fn choose_stays_in_bounds() {
        let set = gates();
        let mut rng = WyRng::seeded(7);
        for _ in 0..1_000 {
            assert!(set.choose(&mut rng) < set.len());
        }
    }
}
