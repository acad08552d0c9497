//! Cross-module tests.

mod routing;
