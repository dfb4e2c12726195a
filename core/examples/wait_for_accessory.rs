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

use anyhow::Result;
use aoap_core::{
    AccessoryHub, AccessoryModeChain, ChainCompletion, ChainFactory, NegotiationError, NusbDevice,
    NusbSource,
};
use log::{info, warn};

/// Placeholder negotiation backend: declines every candidate, so this example
/// only reports devices that are already in accessory mode.
struct DeclineAll;

struct DeclineChain;

impl AccessoryModeChain<NusbDevice> for DeclineChain {
    fn start(&mut self, _device: NusbDevice, completion: ChainCompletion<NusbDevice>) {
        completion.settle(Err(NegotiationError::Rejected(
            "no negotiation backend in this example".into(),
        )));
    }

    fn cancel(&mut self) {}
}

impl ChainFactory<NusbDevice> for DeclineAll {
    type Chain = DeclineChain;

    fn create(&self) -> DeclineChain {
        DeclineChain
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Waiting for an accessory mode device");

    let hub = AccessoryHub::new(Arc::new(NusbSource::new()), DeclineAll);
    let handle = hub.handle();
    let service = hub.run();

    let request = handle.request_device();
    match tokio::time::timeout(Duration::from_secs(30), request).await {
        Ok(Ok(Ok(device))) => info!(
            "Accessory device available: \"{}\" ({:04X}:{:04X})",
            device.info().product_string().unwrap_or("Unknown"),
            device.info().vendor_id(),
            device.info().product_id()
        ),
        Ok(Ok(Err(e))) => warn!("Request failed: {}", e),
        Ok(Err(_)) => warn!("Hub dropped the request"),
        Err(_) => warn!("No accessory device appeared within 30 seconds"),
    }

    handle.cancel();
    service.shutdown().await?;

    info!("Example completed");
    Ok(())
}
