pub mod manager;
pub mod session;
pub mod sort;
pub mod tree;
pub mod validate;

#[cfg(test)]
pub mod testing;
