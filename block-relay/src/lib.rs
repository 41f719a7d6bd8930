// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

pub mod byte_tracker;
pub mod clock;
pub mod config;
pub mod events;
pub mod helper;
pub mod stats;
pub mod utilities;
