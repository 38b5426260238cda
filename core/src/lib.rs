#![no_std]

pub mod scheduler;

pub use scheduler::{
    Queue, Scheduler, ThreadDescriptor, admission, arena, config, diag, dispatcher, housekeeper,
    platform, queue, registry, sched_tests, thread,
};
