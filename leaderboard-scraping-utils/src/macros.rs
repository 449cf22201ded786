/// Compiles the pattern once and hands out a `&'static Regex`.
#[macro_export]
macro_rules! regex {
    ($e: expr) => {{
        use $crate::once_cell::sync::Lazy;
        use $crate::regex_crate::Regex;
        static PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new($e).unwrap());
        &*PATTERN
    }};
}
