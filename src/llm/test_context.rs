/// Explicit recording namespace, overriding the thread name
pub const TEST_NAME_ENV: &str = "FLOWSCOUT_TEST_NAME";

/// Names recordings after the test that produced them.
///
/// Cargo runs each test on a thread named after its path, e.g.
/// `query::engine::tests::ranks_flows`, which becomes
/// `query_engine_tests_ranks_flows`.
pub struct TestContext;

impl TestContext {
    pub fn current_test_name() -> Option<String> {
        if let Some(name) = std::env::var(TEST_NAME_ENV)
            .ok()
            .and_then(|n| Self::file_stem(&n))
        {
            return Some(name);
        }

        match std::thread::current().name() {
            Some("main") | None => None,
            Some(thread_name) => Self::file_stem(thread_name),
        }
    }

    /// Collapses anything outside `[A-Za-z0-9]` into single underscores
    fn file_stem(raw: &str) -> Option<String> {
        let mut stem = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() {
                stem.push(c);
            } else if !stem.is_empty() && !stem.ends_with('_') {
                stem.push('_');
            }
        }

        let stem = stem.trim_end_matches('_');
        (!stem.is_empty()).then(|| stem.to_string())
    }
}
