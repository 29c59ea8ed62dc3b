//! Per-hop signal chain: conversion, decimation, FFT and power accumulation.

pub mod accumulator;
pub mod acquisition;
pub mod decimation;

pub use accumulator::accumulate_spectrum;
pub use acquisition::{Acquisition, SweepOutcome};
pub use decimation::{boxcar, decimate, downsample_iq, droop_fir, droop_taps, fifth_order};
