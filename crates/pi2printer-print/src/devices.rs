// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Known USB thermal printers, in probe order.

use pi2printer_core::types::DeviceDescriptor;

/// Common ESC/POS receipt printers. When several are plugged in, the first
/// reachable entry wins, so the order here is observable.
pub const KNOWN_THERMAL_PRINTERS: &[DeviceDescriptor] = &[
    // Epson
    DeviceDescriptor::new(0x04b8, 0x0202, "Epson TM series"),
    DeviceDescriptor::new(0x04b8, 0x0e15, "Epson TM-T20"),
    DeviceDescriptor::new(0x04b8, 0x0e28, "Epson TM-T20II"),
    DeviceDescriptor::new(0x04b8, 0x0e27, "Epson TM-T20III"),
    DeviceDescriptor::new(0x04b8, 0x0e2a, "Epson TM-T82"),
    // Star
    DeviceDescriptor::new(0x0519, 0x0001, "Star TSP100"),
    DeviceDescriptor::new(0x0519, 0x0003, "Star TSP143"),
    // Generic POS
    DeviceDescriptor::new(0x0fe6, 0x811e, "ITP Printer"),
    DeviceDescriptor::new(0x28e9, 0x0289, "Generic POS Printer"),
    DeviceDescriptor::new(0x1fc9, 0x2016, "Generic Thermal Printer"),
    DeviceDescriptor::new(0x1659, 0x8965, "Thermal Printer"),
    // Citizen
    DeviceDescriptor::new(0x1d90, 0x2168, "Citizen CT-S310"),
    DeviceDescriptor::new(0x1d90, 0x2174, "Citizen CT-S4000"),
    // Bixolon
    DeviceDescriptor::new(0x1504, 0x0006, "Bixolon SRP-275"),
    DeviceDescriptor::new(0x1504, 0x0011, "Bixolon SRP-350"),
];

/// Look up a known printer by vendor/product id.
pub fn lookup(vendor_id: u16, product_id: u16) -> Option<&'static DeviceDescriptor> {
    KNOWN_THERMAL_PRINTERS
        .iter()
        .find(|d| d.vendor_id == vendor_id && d.product_id == product_id)
}

/// Descriptor for an explicitly requested printer, named from the table
/// when it is a known model.
pub fn requested(vendor_id: u16, product_id: u16) -> DeviceDescriptor {
    lookup(vendor_id, product_id)
        .copied()
        .unwrap_or(DeviceDescriptor::new(vendor_id, product_id, "Requested printer"))
}
