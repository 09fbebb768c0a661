//! Dominating nilness facts.
//!
//! A [`FactStack`] holds the facts established by the conditions that
//! dominate the block being visited. It is a persistent cons list: pushing
//! returns a new stack sharing its tail with the old one, so sibling
//! subtrees of the dominator tree never see each other's facts and a clone
//! is a reference-count bump.

use std::rc::Rc;

use nilnop_ir::ir::{Function, ValueId, ValueKind};

use crate::lattice::Nilness;

/// A block is dominated by `value == nil` (or `!= nil`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fact {
    pub value: ValueId,
    pub nilness: Nilness,
}

impl Fact {
    pub fn new(value: ValueId, nilness: Nilness) -> Self {
        Self { value, nilness }
    }

    pub fn negate(self) -> Fact {
        Fact::new(self.value, self.nilness.negate())
    }
}

/// The fact itself plus one fact per interface conversion it unwraps.
///
/// `ChangeInterface` is nilness-transparent, so learning that the outer
/// value is nil also tells us the converted value is nil. Matching on the
/// inner value later catches comparisons that use the other form.
pub fn expand(func: &Function, fact: Fact) -> Vec<Fact> {
    let mut facts = vec![fact];
    let mut current = fact.value;
    // A well-formed chain is never longer than the value table.
    for _ in 0..func.values.len() {
        match func.value(current).map(|v| &v.kind) {
            Some(ValueKind::ChangeInterface { x }) => {
                current = *x;
                facts.push(Fact::new(current, fact.nilness));
            }
            _ => break,
        }
    }
    facts
}

/// Negate every fact.
pub fn negate_all(facts: &[Fact]) -> Vec<Fact> {
    facts.iter().map(|f| f.negate()).collect()
}

struct Node {
    fact: Fact,
    next: Option<Rc<Node>>,
}

/// Persistent stack of dominating facts.
#[derive(Clone, Default)]
pub struct FactStack {
    head: Option<Rc<Node>>,
    len: usize,
}

impl FactStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new stack with `fact` on top. `self` is unchanged.
    pub fn push(&self, fact: Fact) -> FactStack {
        FactStack {
            head: Some(Rc::new(Node {
                fact,
                next: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// A new stack with every fact of `facts` pushed in order.
    pub fn extend<I>(&self, facts: I) -> FactStack
    where
        I: IntoIterator<Item = Fact>,
    {
        facts.into_iter().fold(self.clone(), |stack, f| stack.push(f))
    }

    /// Most recently pushed fact about `value`.
    pub fn lookup(&self, value: ValueId) -> Option<Nilness> {
        self.iter().find(|f| f.value == value).map(|f| f.nilness)
    }

    /// Facts from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = Fact> + '_ {
        let mut node = self.head.as_deref();
        std::iter::from_fn(move || {
            let current = node?;
            node = current.next.as_deref();
            Some(current.fact)
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for FactStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// Unlink iteratively; the default drop recurses once per node.
impl Drop for FactStack {
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut node) => next = node.next.take(),
                Err(_) => break,
            }
        }
    }
}
