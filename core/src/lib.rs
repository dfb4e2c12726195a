pub mod hub;
pub mod negotiation;
pub mod registry;
pub mod request;
pub mod service;
pub mod usb;

pub use hub::{AccessoryHub, HubHandle};
pub use negotiation::{AccessoryModeChain, ChainCompletion, ChainFactory, NegotiationError};
pub use registry::{ChainId, ChainRegistry};
pub use request::{DeviceRequest, RequestError};
pub use service::{spawn_service, ServiceHandle, StopHandle};
pub use usb::aoap::{is_aoap_device, AOAP_ADB_PRODUCT_ID, AOAP_PRODUCT_ID, GOOGLE_VENDOR_ID};
pub use usb::errors::{DeviceAccessError, EnumerationError};
pub use usb::nusb_source::{NusbDevice, NusbSource};
pub use usb::{DeviceDescriptor, HotplugSink, UsbSource};

pub use nusb::DeviceInfo;
