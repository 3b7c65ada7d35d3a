// SYNOID Montage Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod config;
pub mod generation;
pub mod inventory;
pub mod montage;
pub mod state;
