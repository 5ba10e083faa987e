//! End-to-end tests for the texscope pipeline live under `tests/`.
