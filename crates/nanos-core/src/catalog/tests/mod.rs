#[cfg(test)]
mod chain_tests;
