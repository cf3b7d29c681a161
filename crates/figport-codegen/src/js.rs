//! JavaScript stub.
//!
//! Reserved for runtime hooks; nothing is generated yet.

pub const SCRIPT_STUB: &str = "// optional runtime hooks; empty by default\n";

pub fn generate() -> String {
    SCRIPT_STUB.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_is_comment_only() {
        let js = generate();
        assert!(js.lines().all(|line| line.starts_with("//")));
    }
}
