/// Get the version string for freight and libfreight
pub fn get_version_string() -> String {
    format!(
        "freight {}\nlibfreight {}",
        env!("CARGO_PKG_VERSION"),
        libfreight::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
