/// Bundles the echo plugin via nih_plug_xtask. Usage:
///
///   cargo xtask bundle ring-echo --release
///
/// Output lands in `target/bundled/` as `Ring Echo.vst3` and `Ring Echo.clap`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
