fn main() {
    if let Err(err) = xr_scene::run() {
        eprintln!("Application error: {err}");
    }
}
