// SPDX-License-Identifier: GPL-3.0-only

//! Capture device backends

pub mod camera;
