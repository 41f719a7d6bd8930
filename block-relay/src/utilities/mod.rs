pub mod guarded;
