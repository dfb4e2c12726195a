// Copyright 2025 HEM Sp. z o.o.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::fmt;

/// Stable identity of an in-flight negotiation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The set of in-flight negotiation chains, keyed by [`ChainId`].
///
/// An entry is inserted before its chain is started and removed exactly once
/// when the chain's completion is delivered. Only the hub task mutates the
/// registry, so cancellation can iterate it safely: a chain reacting to
/// `cancel` settles through the command queue and is removed on a later turn,
/// never while the iteration is running.
pub struct ChainRegistry<C> {
    next_id: u64,
    entries: HashMap<ChainId, C>,
}

impl<C> ChainRegistry<C> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: HashMap::new(),
        }
    }

    /// Inserts a chain and returns the key used for its later removal. Keys
    /// are never reused within one registry.
    pub fn insert(&mut self, chain: C) -> ChainId {
        let id = ChainId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, chain);
        id
    }

    pub fn get_mut(&mut self, id: ChainId) -> Option<&mut C> {
        self.entries.get_mut(&id)
    }

    /// Removes an entry, returning `None` if the id is not registered.
    pub fn remove(&mut self, id: ChainId) -> Option<C> {
        self.entries.remove(&id)
    }

    /// Visits every registered chain, e.g. to fan out a cancellation signal.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut C)) {
        for chain in self.entries.values_mut() {
            f(chain);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Default for ChainRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
