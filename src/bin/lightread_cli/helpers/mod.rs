// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
// ABOUTME: Helper modules for lightread-cli
// ABOUTME: Terminal page surface and output formatting

pub mod console;
pub mod display;
