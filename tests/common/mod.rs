//! Common test utilities and setup for embedded tests
//!
//! This module provides shared functionality for all defmt-test based tests:
//! - Global logger, panic handler and critical section
//! - Heap for proptest
//! - Test helpers

// Re-export commonly used items for tests (except conflicting macros)
pub use defmt_rtt as _; // global logger
pub use embassy_executor as _;
// nrf-softdevice provides both interrupt vectors and critical section
pub use nrf_softdevice as _;
pub use panic_probe as _; // panic handler
pub use {embassy_nrf as _, embassy_sync as _, embassy_time as _};

// Global allocator for proptest (required for alloc feature in no_std)
pub extern crate alloc;
#[allow(unused)]
pub use alloc::vec;
use core::sync::atomic::{AtomicBool, Ordering};

pub use embedded_alloc::LlffHeap as Heap;

#[global_allocator]
pub static HEAP: Heap = Heap::empty();

// 8KB heap backing store
pub static mut HEAP_MEM: [u8; 8192] = [0; 8192];

static HEAP_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Ensure heap is initialized exactly once
pub fn ensure_heap_initialized() {
    if !HEAP_INITIALIZED.swap(true, Ordering::Relaxed) {
        unsafe {
            let ptr = core::ptr::addr_of_mut!(HEAP_MEM) as *mut u8;
            HEAP.init(ptr as usize, 8192);
        }
    }
}

/// Test helper to create test data arrays
#[allow(unused)]
pub fn create_test_data(size: usize, pattern: u8) -> heapless::Vec<u8, 512> {
    let mut data = heapless::Vec::new();
    for i in 0..size {
        data.push(pattern.wrapping_add(i as u8)).unwrap();
    }
    data
}

/// Feed a whole string through a byte-at-a-time consumer, returning the
/// number of completed lines
#[allow(unused)]
pub fn feed_lines<const N: usize>(
    buf: &mut nrf52840_ble_apps::drivers::uart::LineBuffer<N>,
    input: &[u8],
    mut on_line: impl FnMut(&[u8]),
) -> usize {
    let mut lines = 0;
    for &b in input {
        if let Some(line) = buf.push(b) {
            on_line(line);
            lines += 1;
        }
    }
    lines
}
