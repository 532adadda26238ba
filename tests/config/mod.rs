pub mod fs;
#[allow(dead_code)]
pub mod memory;
