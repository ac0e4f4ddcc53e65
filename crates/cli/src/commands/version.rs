//! `robert version`

pub fn run() {
    println!("robert {}", env!("CARGO_PKG_VERSION"));
}
