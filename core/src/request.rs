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
use tokio::sync::oneshot;

/// Outcome surfaced to an accessory request that did not produce a device.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    #[error("device enumeration is unavailable")]
    EnumerationUnavailable,

    #[error("operation aborted")]
    Aborted,
}

/// Caller-supplied completion handle for one accessory device request.
///
/// Resolution and rejection both consume the request, so a request settles at
/// most once. A caller that dropped its receiver simply misses the outcome;
/// the device ownership then ends with the dropped message.
pub struct DeviceRequest<D> {
    tx: oneshot::Sender<Result<D, RequestError>>,
}

impl<D> DeviceRequest<D> {
    /// Creates a request together with the receiver the caller awaits.
    pub fn new() -> (Self, oneshot::Receiver<Result<D, RequestError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub(crate) fn resolve(self, device: D) {
        let _ = self.tx.send(Ok(device));
    }

    pub(crate) fn reject(self, error: RequestError) {
        let _ = self.tx.send(Err(error));
    }
}

impl<D> From<oneshot::Sender<Result<D, RequestError>>> for DeviceRequest<D> {
    fn from(tx: oneshot::Sender<Result<D, RequestError>>) -> Self {
        Self { tx }
    }
}
