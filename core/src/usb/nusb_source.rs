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

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use nusb::hotplug::HotplugEvent;
use nusb::{list_devices, watch_devices, Device, DeviceInfo};
use tokio::select;

use crate::service::{spawn_service, ServiceHandle};
use crate::usb::errors::{DeviceAccessError, EnumerationError};
use crate::usb::{DeviceDescriptor, HotplugSink, UsbSource};

/// An opened host USB device together with the enumeration record it was
/// opened from, so descriptor reads need no extra transfer.
pub struct NusbDevice {
    info: DeviceInfo,
    device: Device,
}

impl NusbDevice {
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn into_device(self) -> Device {
        self.device
    }
}

/// [`UsbSource`] backed by the host USB stack.
///
/// Hot-plug registration starts a watch task that forwards every `Connected`
/// event into the sink; `Disconnected` events are discarded because the hub
/// only consumes arrivals. Registration and deregistration are idempotent.
#[derive(Default)]
pub struct NusbSource {
    watch: Mutex<Option<ServiceHandle>>,
}

impl NusbSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsbSource for NusbSource {
    type Raw = DeviceInfo;
    type Device = NusbDevice;

    fn register_hotplug(&self, sink: HotplugSink<DeviceInfo>) -> Result<(), EnumerationError> {
        let mut watch = self.watch.lock().unwrap();
        if watch.is_some() {
            return Ok(());
        }
        let mut events = watch_devices().map_err(EnumerationError::WatchUnavailable)?;
        *watch = Some(spawn_service(move |mut stop| async move {
            loop {
                select! {
                    biased;
                    _ = stop.signaled() => {
                        debug!("Hot-plug watch stopped");
                        break;
                    }
                    maybe_event = events.next() => {
                        match maybe_event {
                            Some(HotplugEvent::Connected(device_info)) => {
                                sink.device_appeared(device_info);
                            }
                            Some(HotplugEvent::Disconnected(_)) => {}
                            None => {
                                debug!("Hot-plug event stream ended");
                                break;
                            }
                        }
                    }
                }
            }
        }));
        Ok(())
    }

    fn deregister_hotplug(&self) {
        if let Some(mut watch) = self.watch.lock().unwrap().take() {
            watch.request_shutdown();
        }
    }

    async fn launch_devices(&self) -> Result<Vec<DeviceInfo>, EnumerationError> {
        Ok(list_devices()
            .map_err(EnumerationError::ListFailed)?
            .collect())
    }

    async fn open(&self, raw: DeviceInfo) -> Result<NusbDevice, DeviceAccessError> {
        let device = raw.open().map_err(DeviceAccessError::Open)?;
        Ok(NusbDevice { info: raw, device })
    }

    async fn descriptor(
        &self,
        device: &NusbDevice,
    ) -> Result<DeviceDescriptor, DeviceAccessError> {
        Ok(DeviceDescriptor {
            vendor_id: device.info.vendor_id(),
            product_id: device.info.product_id(),
        })
    }
}
