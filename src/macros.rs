// src/macros.rs

/// String shorthand. `s!()` is an empty `String`, `s!(x)` is `String::from(x)`.
#[macro_export]
macro_rules! s {
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

/// Concatenate string slices into one owned `String`.
#[macro_export]
macro_rules! join {
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Absolute site URL from a path and optional format args:
/// `site!("/my/")`, `site!("/course/view.php?id={}", id)`.
#[macro_export]
macro_rules! site {
    ($($arg:tt)+) => {
        $crate::join!($crate::config::consts::BASE, &format!($($arg)+))
    };
}
