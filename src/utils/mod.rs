// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};
