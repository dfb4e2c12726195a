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

use thiserror::Error;

use crate::registry::ChainId;

/// Why an accessory mode negotiation did not produce a usable device.
#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("negotiation cancelled")]
    Cancelled,

    #[error("device rejected accessory mode switch: {0}")]
    Rejected(String),

    #[error("usb transfer failed during negotiation: {0}")]
    Transfer(std::io::Error),
}

/// One-shot completion handle given to a chain when it is started.
///
/// `settle` consumes the handle, so a chain reports its outcome exactly once;
/// the outcome re-enters the hub's serialized context and triggers the
/// registry removal there. Settling after the hub has shut down is a no-op.
pub struct ChainCompletion<D> {
    id: ChainId,
    deliver: Box<dyn FnOnce(ChainId, Result<D, NegotiationError>) + Send>,
}

impl<D> ChainCompletion<D> {
    pub(crate) fn new(
        id: ChainId,
        deliver: Box<dyn FnOnce(ChainId, Result<D, NegotiationError>) + Send>,
    ) -> Self {
        Self { id, deliver }
    }

    /// Identity of the chain this completion belongs to.
    pub fn id(&self) -> ChainId {
        self.id
    }

    /// Reports the chain's final outcome.
    pub fn settle(self, result: Result<D, NegotiationError>) {
        (self.deliver)(self.id, result);
    }
}

/// An asynchronous accessory mode negotiation for a single device.
///
/// `start` takes ownership of the device and must eventually settle the
/// completion, also when the chain was cancelled in the meantime: a cancelled
/// chain settles with a failure rather than staying silent.
pub trait AccessoryModeChain<D>: Send + 'static {
    fn start(&mut self, device: D, completion: ChainCompletion<D>);

    /// Requests early termination. The completion still settles exactly once.
    fn cancel(&mut self);
}

/// Creates one chain per candidate device that needs negotiation.
pub trait ChainFactory<D>: Send + 'static {
    type Chain: AccessoryModeChain<D>;

    fn create(&self) -> Self::Chain;
}
