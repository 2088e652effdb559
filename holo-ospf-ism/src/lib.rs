//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

pub mod collections;
pub mod config;
pub mod debug;
pub mod election;
pub mod error;
pub mod events;
pub mod instance;
pub mod interface;
pub mod neighbor;
pub mod network;
pub mod output;
pub mod tasks;
