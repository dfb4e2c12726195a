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

/// Vendor id under which devices enumerate once switched to accessory mode.
pub const GOOGLE_VENDOR_ID: u16 = 0x18D1;

/// Product id of a plain accessory mode device.
pub const AOAP_PRODUCT_ID: u16 = 0x2D00;

/// Product id of an accessory mode device with the debug bridge enabled.
pub const AOAP_ADB_PRODUCT_ID: u16 = 0x2D01;

/// Tells whether a device already speaks the accessory protocol.
///
/// A device that reports the accessory vendor id together with one of the
/// accessory product ids has finished the mode switch and can be used
/// directly, without a negotiation chain.
pub fn is_aoap_device(vendor_id: u16, product_id: u16) -> bool {
    vendor_id == GOOGLE_VENDOR_ID
        && (product_id == AOAP_PRODUCT_ID || product_id == AOAP_ADB_PRODUCT_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_accessory_product_ids() {
        assert!(is_aoap_device(GOOGLE_VENDOR_ID, AOAP_PRODUCT_ID));
        assert!(is_aoap_device(GOOGLE_VENDOR_ID, AOAP_ADB_PRODUCT_ID));
    }

    #[test]
    fn rejects_non_accessory_pairs() {
        let cases = [
            // accessory vendor, non-accessory products
            (GOOGLE_VENDOR_ID, 0x0000),
            (GOOGLE_VENDOR_ID, 0x2D02),
            (GOOGLE_VENDOR_ID, 0x4EE1), // Nexus in MTP mode
            // accessory products under a different vendor
            (0x04E8, AOAP_PRODUCT_ID),
            (0x04E8, AOAP_ADB_PRODUCT_ID),
            // unrelated device entirely
            (0x046D, 0xC077),
            (0x0000, 0x0000),
        ];
        for (vendor_id, product_id) in cases {
            assert!(
                !is_aoap_device(vendor_id, product_id),
                "{:04x}:{:04x} must not classify as accessory",
                vendor_id,
                product_id
            );
        }
    }
}
