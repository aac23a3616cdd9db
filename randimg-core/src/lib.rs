// SPDX-License-Identifier: MIT
//
// randimg: Random Noise Images from random.org
// Copyright (c) 2025 randimg Contributors

//! randimg Core Library
//!
//! This crate provides the types and clients needed to fill a 128x128 RGB buffer with
//! random bytes and write it out as a PNG image. Bytes come either from the random.org
//! HTTP API ("true" randomness, consumes the account quota) or from a local
//! pseudo-random generator.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `protocol`: random.org request descriptors, chunk planning and plain-text parsing
//! - `config`: Configuration management with validation
//! - `buffer`: The fixed-shape (128, 128, 3) random buffer
//! - `fetcher`: HTTP client for the quota and integer-generation routes
//! - `source`: The `RandomBufferSource` trait and its remote/local implementations
//! - `encode`: PNG output for a finished buffer
//! - `metrics`: Request counters and latency tracking
//! - `error`: Unified error types

pub mod buffer;
pub mod config;
pub mod encode;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod protocol;
pub mod source;

pub use buffer::RandomBuffer;
pub use error::{Error, Result};
pub use source::{BufferSource, LocalSource, RandomBufferSource, RemoteSource, SourceKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Image width and height in pixels
pub const IMG_DIM: usize = 128;

/// Channels per pixel (r, g, b)
pub const CHANNELS: usize = 3;

/// Number of random integers needed to fill one buffer
pub const NUM_RAND_INTS: usize = IMG_DIM * IMG_DIM * CHANNELS;

/// Largest `num` random.org accepts on a single integer request
pub const MAX_INTEGERS_PER_REQUEST: usize = 10_000;

/// Default random.org endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.random.org/";

/// Default output file name
pub const DEFAULT_OUTPUT_PATH: &str = "rand.png";
