// Cross-module tests
mod integration;
