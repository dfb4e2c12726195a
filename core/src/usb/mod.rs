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

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::usb::errors::{DeviceAccessError, EnumerationError};

pub mod aoap;
pub mod errors;
pub mod nusb_source;

/// The identification fields of a device used for accessory classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceDescriptor {
    /// Tells whether this descriptor belongs to a device already in
    /// accessory mode. See [`aoap::is_aoap_device`].
    pub fn is_aoap(&self) -> bool {
        aoap::is_aoap_device(self.vendor_id, self.product_id)
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Delivery endpoint handed to the platform layer on hot-plug registration.
///
/// Raw device handles pushed through the sink enter the hub's serialized
/// context in arrival order; after the hub has shut down, deliveries become
/// no-ops.
pub struct HotplugSink<R> {
    deliver: Arc<dyn Fn(R) + Send + Sync>,
}

impl<R> Clone for HotplugSink<R> {
    fn clone(&self) -> Self {
        Self {
            deliver: self.deliver.clone(),
        }
    }
}

impl<R> HotplugSink<R> {
    pub(crate) fn new(deliver: impl Fn(R) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Announces a newly surfaced device to the hub.
    pub fn device_appeared(&self, raw: R) {
        (self.deliver)(raw);
    }
}

/// Platform capability the hub depends on for device discovery and access.
///
/// Injected rather than ambient so tests can substitute a fake emitter. The
/// registration calls are idempotent on both ends.
#[async_trait]
pub trait UsbSource: Send + Sync + 'static {
    /// Opaque platform identifier of a surfaced device.
    type Raw: Send + 'static;
    /// Exclusively owned open device; dropping it releases the OS resource.
    type Device: Send + 'static;

    /// Starts delivering hot-plug arrivals into the sink.
    fn register_hotplug(&self, sink: HotplugSink<Self::Raw>) -> Result<(), EnumerationError>;

    /// Stops hot-plug delivery. Safe to call when not registered.
    fn deregister_hotplug(&self);

    /// Devices already connected when the application came up.
    async fn launch_devices(&self) -> Result<Vec<Self::Raw>, EnumerationError>;

    /// Opens a raw handle into an owned device.
    async fn open(&self, raw: Self::Raw) -> Result<Self::Device, DeviceAccessError>;

    /// Reads the identification descriptor of an opened device.
    async fn descriptor(&self, device: &Self::Device)
        -> Result<DeviceDescriptor, DeviceAccessError>;
}
