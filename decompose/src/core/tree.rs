//! Work-item trees and their order-preserving flattening.
//!
//! A tree is either a single item or a (possibly lazy) sequence of trees.
//! Flattening walks it depth-first, left-to-right, without recursion.

use std::fmt;

/// A nested arrangement of work items.
pub enum OpTree<T> {
    /// A single work item.
    Item(T),
    /// An eagerly materialized sequence of subtrees.
    Seq(Vec<OpTree<T>>),
    /// A sequence of subtrees produced on demand.
    Lazy(Box<dyn Iterator<Item = OpTree<T>>>),
}

impl<T> OpTree<T> {
    /// Build a sequence where every element is a single item.
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        OpTree::Seq(items.into_iter().map(OpTree::Item).collect())
    }

    pub fn lazy<I>(trees: I) -> Self
    where
        I: IntoIterator<Item = OpTree<T>>,
        I::IntoIter: 'static,
    {
        OpTree::Lazy(Box::new(trees.into_iter()))
    }

    /// A tree that flattens to nothing.
    pub fn empty() -> Self {
        OpTree::Seq(Vec::new())
    }

    /// Flatten eagerly into a vector.
    pub fn into_items(self) -> Vec<T> {
        flatten(self).collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for OpTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpTree::Item(item) => f.debug_tuple("Item").field(item).finish(),
            OpTree::Seq(trees) => f.debug_tuple("Seq").field(trees).finish(),
            OpTree::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Flatten `tree` into its items, depth-first and left-to-right.
///
/// Lazy subtrees are only pulled as the returned iterator advances.
pub fn flatten<T>(tree: OpTree<T>) -> Flatten<T> {
    let mut flat = Flatten {
        pending: None,
        stack: Vec::new(),
    };
    flat.descend(tree);
    flat
}

enum Frame<T> {
    Seq(std::vec::IntoIter<OpTree<T>>),
    Lazy(Box<dyn Iterator<Item = OpTree<T>>>),
}

/// Iterator returned by [`flatten`].
pub struct Flatten<T> {
    pending: Option<T>,
    stack: Vec<Frame<T>>,
}

impl<T> Flatten<T> {
    fn descend(&mut self, tree: OpTree<T>) {
        match tree {
            OpTree::Item(item) => self.pending = Some(item),
            OpTree::Seq(trees) => self.stack.push(Frame::Seq(trees.into_iter())),
            OpTree::Lazy(trees) => self.stack.push(Frame::Lazy(trees)),
        }
    }
}

impl<T> Iterator for Flatten<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            if let Some(item) = self.pending.take() {
                return Some(item);
            }
            let frame = self.stack.last_mut()?;
            let next = match frame {
                Frame::Seq(trees) => trees.next(),
                Frame::Lazy(trees) => trees.next(),
            };
            match next {
                Some(tree) => self.descend(tree),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
