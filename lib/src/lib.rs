#![no_std]

pub mod cpu;
pub mod klog;
pub mod ring_buffer;
pub mod spinlock;
pub mod testing;
pub mod tsc;

#[doc(hidden)]
pub use paste;

pub use klog::{
    KlogLevel, klog_get_level, klog_init, klog_is_enabled, klog_register_backend, klog_set_level,
};
pub use ring_buffer::RingBuffer;
pub use spinlock::{IrqMutex, IrqMutexGuard};
