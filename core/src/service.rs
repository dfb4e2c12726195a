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

use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle passed into a background task that lets it observe a stop request.
pub struct StopHandle {
    shutdown_rx: oneshot::Receiver<()>,
}

impl StopHandle {
    fn new(shutdown_rx: oneshot::Receiver<()>) -> Self {
        Self { shutdown_rx }
    }

    /// Resolves once a stop was requested.
    ///
    /// Also resolves when the owning [`ServiceHandle`] was dropped without an
    /// explicit shutdown, so a task never waits on a sender that no longer
    /// exists.
    ///
    /// # Example
    /// ```rust
    /// use aoap_core::spawn_service;
    ///
    /// async fn run_service() {
    ///     let service_handle = spawn_service(move |mut stop_handle| async move {
    ///         stop_handle.signaled().await;
    ///     });
    ///     service_handle.shutdown().await.unwrap();
    /// }
    /// ```
    pub async fn signaled(&mut self) {
        (&mut self.shutdown_rx).await.unwrap_or_default();
    }
}

/// A unified handle for background service tasks that support cooperative
/// shutdown and abort.
pub struct ServiceHandle {
    join: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServiceHandle {
    /// Construct a ServiceHandle from a spawned task handle and a oneshot
    /// shutdown sender.
    pub fn new(join: JoinHandle<()>, shutdown_tx: oneshot::Sender<()>) -> Self {
        Self {
            join,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Request cooperative shutdown without awaiting task completion.
    pub fn request_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Await task completion without sending a shutdown signal.
    pub async fn await_join(self) -> Result<(), tokio::task::JoinError> {
        self.join.await
    }

    /// Request cooperative shutdown and await task completion.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.request_shutdown();
        self.await_join().await
    }

    /// Forcefully abort the underlying task.
    pub fn abort(self) {
        self.join.abort();
    }
}

/// Spawn a background service task with a standard stop mechanism.
///
/// The provided function receives a [`StopHandle`] to await for shutdown and
/// runs on a Tokio task. The returned [`ServiceHandle`] allows triggering a
/// cooperative shutdown or aborting.
pub fn spawn_service<Fut, Func>(f: Func) -> ServiceHandle
where
    Fut: Future<Output = ()> + Send + 'static,
    Func: FnOnce(StopHandle) -> Fut + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let stop = StopHandle::new(shutdown_rx);
    let join = tokio::spawn(async move {
        f(stop).await;
    });
    ServiceHandle::new(join, shutdown_tx)
}
