// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

pub mod audit;
pub mod config;
pub mod differ;
pub mod error;
pub mod orchestrator;
pub mod page;
pub mod server;
pub mod stream;
