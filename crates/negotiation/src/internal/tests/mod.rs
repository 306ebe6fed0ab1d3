#[cfg(test)]
mod test_rpc;

pub mod utils;
