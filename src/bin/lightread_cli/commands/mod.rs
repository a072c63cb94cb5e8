// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LightRead
// ABOUTME: Re-exports command modules for lightread-cli
// ABOUTME: Session commands and summarize commands

pub mod session;
pub mod summarize;
