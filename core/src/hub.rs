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

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::select;
use tokio::sync::{mpsc, oneshot};

use crate::negotiation::{AccessoryModeChain, ChainCompletion, ChainFactory, NegotiationError};
use crate::registry::{ChainId, ChainRegistry};
use crate::request::{DeviceRequest, RequestError};
use crate::service::{spawn_service, ServiceHandle};
use crate::usb::{HotplugSink, UsbSource};

// Settle period between opening a candidate device and the first negotiation
// command; some hypervisor USB stacks drop vendor requests issued right after
// open.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

enum HubCommand<R, D> {
    Start(DeviceRequest<D>),
    Cancel,
    DeviceAppeared(R),
    NegotiationDue(D),
    ChainSettled {
        id: ChainId,
        result: Result<D, NegotiationError>,
    },
    ActiveNegotiations(oneshot::Sender<usize>),
}

/// Caller surface of a running [`AccessoryHub`].
///
/// Every operation dispatches a command into the hub's serialized context;
/// commands are processed strictly in dispatch order. Once the hub task has
/// stopped, all operations become no-ops.
pub struct HubHandle<R, D> {
    tx: mpsc::UnboundedSender<HubCommand<R, D>>,
}

impl<R, D> Clone for HubHandle<R, D> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R, D> HubHandle<R, D> {
    /// Installs `request` as the outstanding accessory request. A previously
    /// outstanding request is rejected with [`RequestError::Aborted`] first.
    pub fn start(&self, request: DeviceRequest<D>) {
        let _ = self.tx.send(HubCommand::Start(request));
    }

    /// Convenience wrapper around [`HubHandle::start`] that creates the
    /// request and returns the receiver for its outcome. Timeout policy is
    /// the caller's: the hub keeps the request outstanding indefinitely.
    pub fn request_device(&self) -> oneshot::Receiver<Result<D, RequestError>> {
        let (request, rx) = DeviceRequest::new();
        self.start(request);
        rx
    }

    /// Rejects the outstanding request, signals cancellation to every
    /// in-flight negotiation chain and deregisters the hot-plug listener.
    /// Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(HubCommand::Cancel);
    }

    /// Announces a surfaced device. Normally called through the
    /// [`HotplugSink`] handed to the platform layer.
    pub fn device_appeared(&self, raw: R) {
        let _ = self.tx.send(HubCommand::DeviceAppeared(raw));
    }

    /// Number of in-flight negotiation chains; 0 once the hub has stopped.
    pub async fn active_negotiations(&self) -> usize {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(HubCommand::ActiveNegotiations(reply_tx))
            .is_err()
        {
            return 0;
        }
        reply_rx.await.unwrap_or(0)
    }
}

/// Orchestrates the path from device arrival to a usable accessory device.
///
/// Surfaced devices are classified: one already in accessory mode resolves
/// the outstanding request directly, any other gets an accessory mode
/// negotiation chain of its own. Chains run concurrently, race for the single
/// outstanding request and are tracked in a registry so cancellation reaches
/// each of them. All state transitions run inside one actor task; entry
/// points only enqueue commands, so no interleaving is possible regardless of
/// which thread platform callbacks, timers or chain completions come from.
pub struct AccessoryHub<S, F>
where
    S: UsbSource,
    F: ChainFactory<S::Device>,
{
    source: Arc<S>,
    chain_factory: F,
    cmd_tx: mpsc::UnboundedSender<HubCommand<S::Raw, S::Device>>,
    cmd_rx: mpsc::UnboundedReceiver<HubCommand<S::Raw, S::Device>>,
    outstanding: Option<DeviceRequest<S::Device>>,
    registry: ChainRegistry<F::Chain>,
    settle_delay: Duration,
    launch_scan_done: bool,
    listening: bool,
}

impl<S, F> AccessoryHub<S, F>
where
    S: UsbSource,
    F: ChainFactory<S::Device>,
{
    pub fn new(source: Arc<S>, chain_factory: F) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        Self {
            source,
            chain_factory,
            cmd_tx,
            cmd_rx,
            outstanding: None,
            registry: ChainRegistry::new(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            launch_scan_done: false,
            listening: false,
        }
    }

    /// Overrides the settle period inserted before a negotiation chain is
    /// started.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Caller surface of this hub; may be cloned freely.
    pub fn handle(&self) -> HubHandle<S::Raw, S::Device> {
        HubHandle {
            tx: self.cmd_tx.clone(),
        }
    }

    /// Spawn the hub event loop in background and return its handle.
    ///
    /// Cooperative shutdown runs the cancellation path first, so the
    /// outstanding request and all in-flight chains are informed before the
    /// task ends.
    pub fn run(mut self) -> ServiceHandle {
        spawn_service(move |mut stop| async move {
            loop {
                select! {
                    biased;
                    _ = stop.signaled() => {
                        info!("Accessory hub shutdown requested");
                        self.on_cancel();
                        break;
                    }
                    command = self.cmd_rx.recv() => {
                        match command {
                            Some(command) => self.on_command(command).await,
                            None => break,
                        }
                    }
                }
            }
        })
    }

    async fn on_command(&mut self, command: HubCommand<S::Raw, S::Device>) {
        match command {
            HubCommand::Start(request) => self.on_start(request),
            HubCommand::Cancel => self.on_cancel(),
            HubCommand::DeviceAppeared(raw) => self.on_device_appeared(raw).await,
            HubCommand::NegotiationDue(device) => self.on_negotiation_due(device),
            HubCommand::ChainSettled { id, result } => self.on_chain_settled(id, result),
            HubCommand::ActiveNegotiations(reply) => {
                let _ = reply.send(self.registry.len());
            }
        }
    }

    fn on_start(&mut self, request: DeviceRequest<S::Device>) {
        if let Some(previous) = self.outstanding.take() {
            debug!("Displacing previously outstanding accessory request");
            previous.reject(RequestError::Aborted);
        }

        if !self.listening {
            if let Err(e) = self.source.register_hotplug(self.hotplug_sink()) {
                warn!("Failed to register hot-plug listener: {}", e);
                request.reject(RequestError::EnumerationUnavailable);
                return;
            }
            self.listening = true;
        }

        self.outstanding = Some(request);

        if !self.launch_scan_done {
            self.launch_scan_done = true;
            let source = self.source.clone();
            let sink = self.hotplug_sink();
            tokio::spawn(async move {
                match source.launch_devices().await {
                    Ok(devices) => {
                        for raw in devices {
                            sink.device_appeared(raw);
                        }
                    }
                    Err(e) => warn!("Failed to scan launch-time devices: {}", e),
                }
            });
        }
    }

    fn on_cancel(&mut self) {
        if let Some(request) = self.outstanding.take() {
            request.reject(RequestError::Aborted);
        }
        self.registry.for_each_mut(|chain| chain.cancel());
        if self.listening {
            self.source.deregister_hotplug();
            self.listening = false;
        }
    }

    async fn on_device_appeared(&mut self, raw: S::Raw) {
        if self.outstanding.is_none() {
            debug!("Device appeared with no outstanding request; ignoring");
            return;
        }

        let device = match self.source.open(raw).await {
            Ok(device) => device,
            Err(e) => {
                warn!("Failed to open surfaced device: {}", e);
                return;
            }
        };
        let descriptor = match self.source.descriptor(&device).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("Failed to read device descriptor: {}", e);
                return;
            }
        };

        if descriptor.is_aoap() {
            info!("Accessory mode device found ({}); resolving request", descriptor);
            if let Some(request) = self.outstanding.take() {
                request.resolve(device);
            }
        } else {
            debug!("Device {} requires accessory mode negotiation", descriptor);
            let cmd_tx = self.cmd_tx.clone();
            let settle_delay = self.settle_delay;
            tokio::spawn(async move {
                tokio::time::sleep(settle_delay).await;
                let _ = cmd_tx.send(HubCommand::NegotiationDue(device));
            });
        }
    }

    fn on_negotiation_due(&mut self, device: S::Device) {
        if self.outstanding.is_none() {
            debug!("Negotiation window closed; dropping device");
            return;
        }

        let chain = self.chain_factory.create();
        let id = self.registry.insert(chain);
        let completion = self.chain_completion(id);
        if let Some(chain) = self.registry.get_mut(id) {
            chain.start(device, completion);
        }
    }

    fn on_chain_settled(&mut self, id: ChainId, result: Result<S::Device, NegotiationError>) {
        if self.registry.remove(id).is_none() {
            debug!("Completion for chain {} not found in registry", id);
        }
        match result {
            Ok(device) => match self.outstanding.take() {
                Some(request) => {
                    info!("Accessory mode negotiation finished; resolving request");
                    request.resolve(device);
                }
                None => debug!("Negotiated device arrived after request settled; dropping"),
            },
            Err(e) => debug!("Accessory mode negotiation failed: {}", e),
        }
    }

    fn hotplug_sink(&self) -> HotplugSink<S::Raw> {
        let cmd_tx = self.cmd_tx.clone();
        HotplugSink::new(move |raw| {
            let _ = cmd_tx.send(HubCommand::DeviceAppeared(raw));
        })
    }

    fn chain_completion(&self, id: ChainId) -> ChainCompletion<S::Device> {
        let cmd_tx = self.cmd_tx.clone();
        ChainCompletion::new(
            id,
            Box::new(move |id, result| {
                let _ = cmd_tx.send(HubCommand::ChainSettled { id, result });
            }),
        )
    }
}
