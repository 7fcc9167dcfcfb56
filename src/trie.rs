//! Prefix tree over the words a board could possibly contain.
//!
//! Nodes live in a flat arena and are addressed by [`NodeId`]; the entry node
//! is always [`Trie::ROOT`]. Path search walks the grid and the trie together,
//! one [`Trie::step`] per cell, so a missing edge is an ordinary `None` rather
//! than an error.
//!
//! A built trie can be written to disk with [`Trie::save`] and read back with
//! [`Trie::load`] for offline experiments (see the `longest` CLI command).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

/// Index of a node in the trie's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrieNode {
    children: HashMap<char, NodeId>,
    terminal: bool,
}

/// Errors reading or writing a persisted trie.
#[derive(Debug, thiserror::Error)]
pub enum TrieError {
    #[error("failed to access trie file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode trie: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode trie: {0}")]
    Decode(#[source] bincode::Error),

    #[error("corrupt trie: {reason}")]
    Corrupt { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    word_count: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// The entry node every walk starts from.
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Trie { nodes: vec![TrieNode::default()], word_count: 0 }
    }

    /// Insert `word`, creating nodes as needed.
    ///
    /// Returns `true` if the word was not already present. Re-adding a word
    /// leaves the trie unchanged.
    pub fn add_word(&mut self, word: &str) -> bool {
        let mut node = Self::ROOT;
        for c in word.chars() {
            node = match self.step(node, c) {
                Some(next) => next,
                None => {
                    let next = NodeId(self.nodes.len() as u32);
                    self.nodes.push(TrieNode::default());
                    self.nodes[node.0 as usize].children.insert(c, next);
                    next
                }
            };
        }

        let terminal = &mut self.nodes[node.0 as usize].terminal;
        if *terminal {
            false
        } else {
            *terminal = true;
            self.word_count += 1;
            true
        }
    }

    /// Follow the edge labelled `letter` out of `node`, if there is one.
    pub fn step(&self, node: NodeId, letter: char) -> Option<NodeId> {
        self.nodes.get(node.0 as usize)?.children.get(&letter).copied()
    }

    /// True if a word ends at `node`.
    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.nodes.get(node.0 as usize).is_some_and(|n| n.terminal)
    }

    /// Walk `prefix` from the root.
    pub fn walk(&self, prefix: &str) -> Option<NodeId> {
        prefix.chars().try_fold(Self::ROOT, |node, c| self.step(node, c))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.walk(word).is_some_and(|node| self.is_terminal(node))
    }

    /// Number of distinct words stored.
    pub fn len(&self) -> usize {
        self.word_count
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Encode the trie with bincode.
    ///
    /// # Errors
    ///
    /// Returns `TrieError::Encode` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TrieError> {
        bincode::serialize(self).map_err(TrieError::Encode)
    }

    /// Decode a trie previously produced by [`Trie::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns `TrieError::Decode` for undecodable bytes and
    /// `TrieError::Corrupt` if the decoded arena is inconsistent.
    pub fn from_bytes(bytes: &[u8]) -> Result<Trie, TrieError> {
        let trie: Trie = bincode::deserialize(bytes).map_err(TrieError::Decode)?;
        trie.check()?;
        Ok(trie)
    }

    /// Write the trie to `path`.
    ///
    /// # Errors
    ///
    /// Returns `TrieError::Io` if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TrieError> {
        let path_ref = path.as_ref();
        let io_err = |source| TrieError::Io { path: path_ref.display().to_string(), source };

        let file = File::create(path_ref).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self).map_err(TrieError::Encode)?;
        writer.flush().map_err(io_err)
    }

    /// Read a trie written by [`Trie::save`].
    ///
    /// # Errors
    ///
    /// Returns `TrieError::Io` if the file is missing or unreadable, and
    /// `TrieError::Decode`/`TrieError::Corrupt` if its contents are not a valid trie.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Trie, TrieError> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|source| TrieError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;

        let trie: Trie = bincode::deserialize_from(BufReader::new(file)).map_err(TrieError::Decode)?;
        trie.check()?;
        Ok(trie)
    }

    /// Every child id must point into the arena and the word count must match
    /// the terminal flags.
    fn check(&self) -> Result<(), TrieError> {
        if self.nodes.is_empty() {
            return Err(TrieError::Corrupt { reason: "no root node".to_string() });
        }

        let n = self.nodes.len();
        if let Some(bad) = self
            .nodes
            .iter()
            .flat_map(|node| node.children.values())
            .find(|id| id.0 as usize >= n || id.0 == 0)
        {
            return Err(TrieError::Corrupt { reason: format!("edge to node {} of {n}", bad.0) });
        }

        let terminals = self.nodes.iter().filter(|node| node.terminal).count();
        if terminals != self.word_count {
            return Err(TrieError::Corrupt {
                reason: format!("{terminals} terminal nodes but {} words recorded", self.word_count),
            });
        }

        Ok(())
    }
}

impl<'a> FromIterator<&'a str> for Trie {
    fn from_iter<I: IntoIterator<Item = &'a str>>(words: I) -> Self {
        let mut trie = Trie::new();
        for word in words {
            trie.add_word(word);
        }
        trie
    }
}
