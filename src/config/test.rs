use super::{truncate_thread_name, Config};

#[test]
fn trace_path_format() {
    let cfg = Config::new("/tmp/mygame");
    let path = cfg.trace_path("render", 42);
    assert_eq!(path.to_str().unwrap(), "/tmp/mygame.render.42.trace");
}

#[test]
fn truncates_long_names_on_char_boundary() {
    let long = "x".repeat(100);
    let truncated = truncate_thread_name(&long, 63);
    assert_eq!(truncated.len(), 63);
}

#[test]
fn short_names_pass_through() {
    assert_eq!(truncate_thread_name("main", 63), "main");
}
