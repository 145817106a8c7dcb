use std::path::Path;

use loadgate_core::LoadgateConfig;
use loadgate_gate::PathMatcher;

pub fn check(config_path: &Path, paths: &[String]) -> anyhow::Result<()> {
    let config = LoadgateConfig::from_file(config_path)?;
    let matcher = PathMatcher::new(config.filtered_paths())?;

    if matcher.is_empty() {
        println!("no filtered paths configured; every request passes through");
    }
    for path in paths {
        println!("{}", describe(&matcher, path));
    }
    Ok(())
}

fn describe(matcher: &PathMatcher, path: &str) -> String {
    let verdict = if matcher.matches(path) {
        "throttled"
    } else {
        "pass-through"
    };
    format!("{path}\t{verdict}")
}
